//! End-to-end behaviour of the standard controllers over stub services.

use std::sync::Arc;
use std::time::Duration;

use liaison_controller::model::{
    ActivityQuery, BulkNotification, Channel, Credentials, FileSearch, FileUpload, Message,
    MessageKind, MessageSearch, NewChannel, NewMessage, NotificationKind, Registration, User,
    UserPermission, UserRef, UserUpdate,
};
use liaison_controller::{
    ChannelController, Controller, ControllerSettings, FileController, MessageController,
    NotificationController, UserController,
};
use liaison_core::{ErrorCode, OperationError};
use liaison_telemetry::LogLevel;
use liaison_test::{
    fixtures, ActivityRecorder, PermissionFake, ScriptedUseCase, StubServices, TestHarness,
};

#[tokio::test]
async fn test_success_rate_over_mixed_outcomes() {
    let mut stub = StubServices::new();
    stub.services.user.authenticate = Arc::new(
        ScriptedUseCase::<Credentials, User>::new().then_fail(OperationError::status(401, "bad password")),
    );
    let harness = TestHarness::with_stub(stub);
    let users = harness.controller::<UserController>("user").unwrap();

    for _ in 0..3 {
        users.get_current_user().await.unwrap();
    }
    let err = users
        .authenticate_user(fixtures::credentials("ana@example.test"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthenticationFailed);

    let info = users.info();
    assert_eq!(info.total_flows, 4);
    assert_eq!(info.active_flows, 0);
    assert!((info.success_rate - 75.0).abs() < f64::EPSILON);

    let metrics = users.metrics();
    assert_eq!(metrics.total_operations, 4);
    assert_eq!(metrics.successful_operations, 3);
    assert_eq!(metrics.failed_operations, 1);
    assert!(metrics.last_operation_time.is_some());
}

#[tokio::test]
async fn test_permission_denied_skips_use_case() {
    let create = Arc::new(ScriptedUseCase::<NewChannel, Channel>::new().then_return(fixtures::channel("c1", "u1")));
    let mut stub = StubServices::with_permissions(PermissionFake::allow_all().deny("channel", "create"));
    stub.services.channel.create = create.clone();
    let harness = TestHarness::with_stub(stub);
    let channels = harness.controller::<ChannelController>("channel").unwrap();

    let err = channels
        .create_channel(fixtures::new_channel("general", "u1"))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::PermissionDenied);
    assert!(err.user_friendly);
    assert_eq!(err.context, "ChannelController");
    assert_eq!(err.operation, "createChannel");
    assert_eq!(create.call_count(), 0);
    assert_eq!(harness.stub.permissions.requests().len(), 1);
    assert!(harness.stub.activity.entries().is_empty());
}

#[tokio::test]
async fn test_validation_rejects_before_use_case() {
    let register = Arc::new(ScriptedUseCase::<Registration, User>::new());
    let mut stub = StubServices::new();
    stub.services.user.register = register.clone();
    let harness = TestHarness::with_stub(stub);
    let users = harness.controller::<UserController>("user").unwrap();

    let err = users
        .register_user(Registration {
            password: "abc".to_string(),
            ..fixtures::registration("not-an-email", "A")
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(register.call_count(), 0);

    let fields: Vec<_> = err
        .original()
        .violations()
        .iter()
        .map(|v| v.field.as_str())
        .collect();
    assert_eq!(fields, vec!["email", "password", "name"]);
    assert_eq!(users.metrics().failed_operations, 1);
}

#[tokio::test]
async fn test_activity_recorded_per_operation() {
    let harness = TestHarness::new();
    let users = harness.controller::<UserController>("user").unwrap();
    let messages = harness.controller::<MessageController>("message").unwrap();

    users
        .authenticate_user(fixtures::credentials("ana@example.test"))
        .await
        .unwrap();
    let sent = messages
        .send_message(fixtures::new_message("c1", "u1", "hello"))
        .await
        .unwrap();
    assert_eq!(sent.content, "hello");
    assert!(messages.delete_message(&sent.id, "u1").await.unwrap());
    users.logout_user("u1").await.unwrap();

    assert_eq!(
        harness.stub.activity.actions(),
        vec!["USER_LOGIN", "MESSAGE_SEND", "MESSAGE_DELETE", "USER_LOGOUT"]
    );
    let login = &harness.stub.activity.entries()[0];
    assert_eq!(login.details["email"], "ana@example.test");
}

#[tokio::test]
async fn test_failed_activity_is_logged_not_raised() {
    let stub = StubServices::with_fakes(PermissionFake::allow_all(), ActivityRecorder::failing());
    let harness = TestHarness::with_stub(stub);
    let channels = harness.controller::<ChannelController>("channel").unwrap();

    channels.leave_channel("c1", "u1").await.unwrap();

    assert_eq!(harness.stub.activity.actions(), vec!["CHANNEL_LEAVE"]);
    let warnings = harness.sink.at_level(LogLevel::Warn);
    assert!(warnings.iter().any(|r| r.message == "Failed to record activity"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_network_error() {
    let search = Arc::new(
        ScriptedUseCase::<MessageSearch, Vec<Message>>::new()
            .then_return(Vec::new())
            .with_delay(Duration::from_secs(5)),
    );
    let mut stub = StubServices::new();
    stub.services.message.search = search.clone();
    let settings = ControllerSettings::default().with_operation_timeout(Some(Duration::from_millis(100)));
    let harness = TestHarness::with_settings(stub, settings);
    let messages = harness.controller::<MessageController>("message").unwrap();

    let err = messages
        .search_messages(MessageSearch {
            channel_id: "c1".to_string(),
            user_id: "u1".to_string(),
            query: "hello".to_string(),
            limit: None,
            offset: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NetworkError);
    assert!(matches!(err.original(), OperationError::Timeout(limit) if *limit == Duration::from_millis(100)));
    assert_eq!(search.call_count(), 1);
}

#[tokio::test]
async fn test_unclassified_error_is_not_user_friendly() {
    let mut stub = StubServices::new();
    stub.services.user.update = Arc::new(
        ScriptedUseCase::<UserUpdate, User>::new().then_fail(OperationError::msg("quantum flux")),
    );
    let harness = TestHarness::with_stub(stub);
    let users = harness.controller::<UserController>("user").unwrap();

    let err = users
        .update_user(UserUpdate {
            user_id: "u1".to_string(),
            name: Some("Ana".to_string()),
            ..UserUpdate::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::UnknownError);
    assert!(!err.user_friendly);
    assert_eq!(err.message, "quantum flux");
}

#[tokio::test]
async fn test_flow_attributed_to_acting_user() {
    let harness = TestHarness::new();
    let users = harness.controller::<UserController>("user").unwrap();

    users
        .update_user(UserUpdate {
            user_id: "u7".to_string(),
            ..UserUpdate::default()
        })
        .await
        .unwrap();

    let flows = users.core().flows().completed_flows();
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].operation, "updateUser");
    assert_eq!(flows[0].metadata.get("user_id").map(String::as_str), Some("u7"));
    assert!(flows[0].is_success());
}

#[tokio::test]
async fn test_repeat_reads_hit_cache_until_delete() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let files = harness.controller::<FileController>("file")?;

    files.get_file_info("f1", "u1").await?;
    files.get_file_info("f1", "u1").await?;
    let stats = files.core().caching().stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);

    files.delete_file("f1", "u1").await?;
    assert_eq!(files.core().caching().stats().entries, 0);

    files.get_file_info("f1", "u1").await?;
    assert_eq!(files.core().caching().stats().hits, 1);
    assert!(harness.sink.contains("Cache hit for FileController.getFileInfo"));
    Ok(())
}

#[tokio::test]
async fn test_upload_checks_global_scope_without_channel() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let files = harness.controller::<FileController>("file")?;

    let info = files
        .upload_file(FileUpload {
            user_id: "u1".to_string(),
            channel_id: None,
            file_name: "notes.txt".to_string(),
            file_size: 42,
            mime_type: "text/plain".to_string(),
            description: None,
            tags: Vec::new(),
        })
        .await?;

    assert_eq!(info.file_name, "notes.txt");
    let request = &harness.stub.permissions.requests()[0];
    assert_eq!(request.action, "upload_file");
    assert_eq!(request.resource_id.as_deref(), Some("global"));
    assert_eq!(harness.stub.activity.actions(), vec!["FILE_UPLOAD"]);
    Ok(())
}

#[tokio::test]
async fn test_bulk_notifications_report_delivery() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let notifications = harness.controller::<NotificationController>("notification")?;

    let delivery = notifications
        .send_bulk_notifications(BulkNotification {
            sender_id: "admin".to_string(),
            user_ids: vec!["u1".to_string(), "u2".to_string(), "u3".to_string()],
            kind: NotificationKind::System,
            title: "Maintenance".to_string(),
            body: "Tonight at 22:00".to_string(),
        })
        .await?;

    assert_eq!(delivery.sent, 3);
    assert_eq!(delivery.failed, 0);
    assert_eq!(harness.stub.activity.actions(), vec!["BULK_NOTIFICATION_SENT"]);
    Ok(())
}

#[tokio::test]
async fn test_message_content_limit() {
    let harness = TestHarness::new();
    let messages = harness.controller::<MessageController>("message").unwrap();

    let err = messages
        .send_message(NewMessage {
            content: "x".repeat(1001),
            ..fixtures::new_message("c1", "u1", "")
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(harness.stub.permissions.requests().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_keep_counts_consistent() {
    let update = Arc::new(
        ScriptedUseCase::<UserUpdate, User>::responding(|update| {
            let n: usize = update.user_id.trim_start_matches('u').parse().unwrap_or(0);
            if n % 4 == 0 {
                Err(OperationError::status(500, "db down"))
            } else {
                Ok(fixtures::user(&update.user_id))
            }
        })
        .with_delay(Duration::from_millis(1)),
    );
    let mut stub = StubServices::new();
    stub.services.user.update = update.clone();
    let harness = TestHarness::with_stub(stub);
    let users = harness.controller::<UserController>("user").unwrap();

    let handles: Vec<_> = (0..200)
        .map(|n| {
            let users = Arc::clone(&users);
            tokio::spawn(async move {
                users
                    .update_user(UserUpdate {
                        user_id: format!("u{n}"),
                        ..UserUpdate::default()
                    })
                    .await
            })
        })
        .collect();

    let mut failures = 0;
    for handle in handles {
        if handle.await.unwrap().is_err() {
            failures += 1;
        }
    }

    assert_eq!(failures, 50);
    assert_eq!(update.call_count(), 200);

    let metrics = users.metrics();
    assert_eq!(metrics.total_operations, 200);
    assert_eq!(metrics.successful_operations, 150);
    assert_eq!(metrics.failed_operations, 50);

    let info = users.info();
    assert_eq!(info.total_flows, 200);
    assert_eq!(info.active_flows, 0);
    assert!((info.success_rate - 75.0).abs() < f64::EPSILON);
    assert_eq!(harness.stub.activity.entries().len(), 150);
}

#[tokio::test]
async fn test_user_stats_combine_activity_and_permissions() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let users = harness.controller::<UserController>("user")?;

    let stats = users.get_user_stats("u3").await?;
    assert_eq!(stats.total_activities, 3);
    assert_eq!(stats.recent_activities[0].user_id, "u3");
    assert_eq!(stats.total_permissions, 2);
    assert_eq!(stats.permissions, vec!["channel:create", "message:send"]);

    let sends = users
        .get_user_activity_logs(ActivityQuery {
            user_id: "u3".to_string(),
            activity: Some("MESSAGE_SEND".to_string()),
            ..ActivityQuery::default()
        })
        .await?;
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].action, "MESSAGE_SEND");

    let permissions = users.get_user_permissions("u3").await?;
    assert_eq!(permissions.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_user_stats_fail_when_either_source_fails() {
    let mut stub = StubServices::new();
    stub.services.user.permissions = Arc::new(
        ScriptedUseCase::<UserRef, Vec<UserPermission>>::new()
            .then_fail(OperationError::network("permission service offline")),
    );
    let harness = TestHarness::with_stub(stub);
    let users = harness.controller::<UserController>("user").unwrap();

    let err = users.get_user_stats("u3").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NetworkError);
}

#[tokio::test]
async fn test_file_search_and_stats() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let files = harness.controller::<FileController>("file")?;

    let found = files
        .search_files(FileSearch {
            user_id: "u1".to_string(),
            query: "f2".to_string(),
            ..FileSearch::default()
        })
        .await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "f2");

    let stats = files.get_file_stats("u1").await?;
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_size, 640);
    assert_eq!(stats.by_type["text"], 1);
    assert_eq!(stats.by_type["image"], 1);
    assert_eq!(stats.by_month["1970-01"], 2);
    assert!((stats.average_file_size - 320.0).abs() < f64::EPSILON);

    let actions: Vec<_> = harness
        .stub
        .permissions
        .requests()
        .into_iter()
        .map(|r| r.action)
        .collect();
    assert_eq!(actions, vec!["search_files", "view_stats"]);
    Ok(())
}

#[tokio::test]
async fn test_update_file_tags_drops_cached_reads() -> anyhow::Result<()> {
    let harness = TestHarness::new();
    let files = harness.controller::<FileController>("file")?;

    files.get_file_info("f1", "u1").await?;
    let info = files
        .update_file_tags("f1", "u1", vec!["design".to_string()])
        .await?;
    assert_eq!(info.tags, vec!["design"]);

    files.get_file_info("f1", "u1").await?;
    assert_eq!(files.core().caching().stats().hits, 0);

    let entries = harness.stub.activity.entries();
    let tagged = entries
        .iter()
        .find(|e| e.action == "FILE_TAGS_UPDATED")
        .expect("tag update recorded");
    assert_eq!(tagged.resource_id.as_deref(), Some("f1"));
    assert_eq!(tagged.details["newTags"][0], "design");
    Ok(())
}

#[tokio::test]
async fn test_message_stats_over_recent_messages() -> anyhow::Result<()> {
    let image = Message {
        kind: MessageKind::Image,
        ..fixtures::message("m2", "c1", "u2", "pic")
    };
    let search = Arc::new(ScriptedUseCase::<MessageSearch, Vec<Message>>::new().then_return(vec![
        fixtures::message("m1", "c1", "u1", "hello"),
        image,
        fixtures::message("m3", "c1", "u1", "a"),
    ]));
    let mut stub = StubServices::new();
    stub.services.message.search = search.clone();
    let harness = TestHarness::with_stub(stub);
    let messages = harness.controller::<MessageController>("message")?;

    let stats = messages.get_message_stats("c1", "u1").await?;
    assert_eq!(stats.total_messages, 3);
    assert_eq!(stats.user_messages, 2);
    assert_eq!(stats.messages_with_files, 1);
    assert!((stats.average_message_length - 3.0).abs() < f64::EPSILON);

    let sent = &search.calls()[0];
    assert_eq!(sent.query, "");
    assert_eq!(sent.limit, Some(100));
    Ok(())
}
