//! Registry lifecycle against stub services.

use std::sync::Arc;

use liaison_controller::{
    ChannelController, Controller, ControllerRegistry, ControllerSettings, RegistryError,
    UserController, CAPABILITIES, METADATA_VERSION,
};
use liaison_test::{StubServices, TestHarness};

fn registry() -> ControllerRegistry {
    ControllerRegistry::standard(ControllerSettings::default(), StubServices::new().services())
}

#[test]
fn test_standard_types() {
    assert_eq!(
        registry().registered_types(),
        vec!["channel", "file", "message", "notification", "user"]
    );
}

#[test]
fn test_create_is_idempotent_and_case_insensitive() {
    let registry = registry();
    let first = registry.create_controller("user").unwrap();
    let second = registry.create_controller("User").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.name(), "UserController");
    assert_eq!(registry.factory_info().total_controllers, 1);
}

#[test]
fn test_unknown_type() {
    let err = registry().create_controller("analytics").err().unwrap();
    assert_eq!(err, RegistryError::UnknownType("analytics".to_string()));
    assert_eq!(err.to_string(), "Unknown controller type: analytics");
}

#[test]
fn test_typed_lookup() {
    let registry = registry();
    let users = registry.typed::<UserController>("user").unwrap();
    assert_eq!(users.name(), "UserController");

    let err = registry.typed::<ChannelController>("user").unwrap_err();
    assert!(matches!(err, RegistryError::TypeMismatch { ref type_name, .. } if type_name == "user"));
}

#[tokio::test]
async fn test_remove_then_recreate() {
    let registry = registry();
    let first = registry.create_controller("channel").unwrap();

    assert!(registry.remove_controller("channel").await);
    assert!(!registry.remove_controller("channel").await);
    assert!(registry.get_controller("channel").is_none());

    let second = registry.create_controller("channel").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_initialize_and_cleanup_all() {
    let registry = registry();
    for type_name in ["user", "message", "file"] {
        registry.create_controller(type_name).unwrap();
    }

    registry.initialize_all_controllers().await;
    let info = registry.factory_info();
    assert_eq!(info.total_controllers, 3);
    assert_eq!(info.active_controllers, 3);
    assert_eq!(info.controller_types, vec!["file", "message", "user"]);

    let file = registry.get_controller("file").unwrap();
    registry.cleanup_all_controllers().await;
    assert!(!file.is_active());
    assert_eq!(registry.factory_info().total_controllers, 0);
}

#[test]
fn test_metadata_only_for_built_controllers() {
    let registry = registry();
    assert!(registry.controller_metadata("notification").is_none());

    registry.create_controller("notification").unwrap();
    let metadata = registry.controller_metadata("Notification").unwrap();

    assert_eq!(metadata.name, "NotificationController");
    assert_eq!(metadata.version, METADATA_VERSION);
    assert_eq!(metadata.description, "NotificationController controller");
    assert_eq!(metadata.capabilities, CAPABILITIES.to_vec());
    assert!(metadata.dependencies.is_empty());
    assert!(registry.controller_metadata("analytics").is_none());
}

#[tokio::test]
async fn test_stats_cover_built_controllers() {
    let harness = TestHarness::new();
    let users = harness.controller::<UserController>("user").unwrap();
    users.get_current_user().await.unwrap();

    let stats = harness.registry.controller_stats();
    let user_stats = &stats["user"];
    assert!(user_stats.is_active);
    assert_eq!(user_stats.metrics.total_operations, 1);
    assert_eq!(user_stats.info.total_flows, 1);

    let json = harness.registry.stats_json();
    assert_eq!(json["factory"]["total_controllers"], 1);
    assert_eq!(json["controllers"]["user"]["metrics"]["successful_operations"], 1);
}

#[test]
fn test_custom_factory_replaces_standard() {
    let registry = registry().with_factory("USER", |settings, services| {
        ChannelController::new(settings, services)
    });
    let controller = registry.create_controller("user").unwrap();
    assert_eq!(controller.name(), "ChannelController");
}
