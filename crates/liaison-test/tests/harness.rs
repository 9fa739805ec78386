//! The doubles working together against real controllers.

use std::sync::Arc;

use liaison_controller::{Controller, NotificationController};
use liaison_controller::model::{NewNotification, NotificationKind};
use liaison_telemetry::LogLevel;
use liaison_test::{EventLog, RecordingMiddleware, TestHarness};

fn notification(title: &str) -> NewNotification {
    NewNotification {
        user_id: "u2".to_string(),
        kind: NotificationKind::Mention,
        title: title.to_string(),
        body: "You were mentioned".to_string(),
        data: None,
    }
}

#[tokio::test]
async fn test_recording_stage_sits_between_standard_stages() {
    let harness = TestHarness::new();
    let notifications = harness
        .controller::<NotificationController>("notification")
        .unwrap();
    let log = EventLog::new();
    notifications
        .core()
        .chain()
        .add(Arc::new(RecordingMiddleware::new("audit", 15, &log)));

    notifications
        .send_notification(notification("Mention"))
        .await
        .unwrap();

    assert_eq!(
        log.events(),
        vec![
            "audit:before:NotificationController.sendNotification",
            "audit:after:NotificationController.sendNotification",
        ]
    );
    assert_eq!(
        notifications.core().chain().middleware_names(),
        vec![
            "ValidationMiddleware",
            "LoggingMiddleware",
            "audit",
            "PerformanceMiddleware",
            "CachingMiddleware",
        ]
    );
}

#[tokio::test]
async fn test_validation_rejection_reaches_later_error_hooks() {
    let harness = TestHarness::new();
    let notifications = harness
        .controller::<NotificationController>("notification")
        .unwrap();
    let log = EventLog::new();
    notifications
        .core()
        .chain()
        .add(Arc::new(RecordingMiddleware::new("audit", 15, &log)));

    let err = notifications
        .send_notification(notification(&"t".repeat(101)))
        .await
        .unwrap_err();

    assert_eq!(err.code.as_str(), "VALIDATION_ERROR");
    assert_eq!(
        log.events(),
        vec!["audit:on_error:NotificationController.sendNotification"]
    );
    assert!(harness.stub.permissions.requests().is_empty());
    assert!(!harness.sink.at_level(LogLevel::Warn).is_empty());
}

#[tokio::test]
async fn test_sink_captures_controller_lifecycle() {
    let harness = TestHarness::new();
    let notifications = harness
        .controller::<NotificationController>("notification")
        .unwrap();

    notifications.initialize().await;
    notifications.initialize().await;
    harness.registry.cleanup_all_controllers().await;

    let messages = harness.sink.messages();
    let inits = messages
        .iter()
        .filter(|m| *m == "Initializing controller")
        .count();
    assert_eq!(inits, 1);
    assert!(harness.sink.contains("Controller cleaned up"));
}
