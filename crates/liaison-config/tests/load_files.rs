//! File-based loading tests.

use std::io::Write;

use liaison_config::{ConfigError, ConfigLoader, LogFormat};
use tempfile::Builder;

#[test]
fn test_load_toml_file() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[telemetry]
service_name = "coach-web"

[telemetry.logging]
format = "pretty"
remote_forwarding = true

[cache]
default_ttl_secs = 90

[cache.ttl_secs]
"MessageController:getMessages" = 15
"#
    )
    .unwrap();

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.telemetry.service_name, "coach-web");
    assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    assert!(config.telemetry.logging.remote_forwarding);
    assert_eq!(config.cache.default_ttl_secs, 90);
    // A file table replaces the default TTL table outright.
    assert_eq!(config.cache.ttl_secs.len(), 1);
    assert_eq!(config.cache.ttl_secs["MessageController:getMessages"], 15);
    assert_eq!(config.pipeline.flow_history_capacity, 1000);
}

#[test]
fn test_load_json_file() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{"pipeline": {{"flow_history_capacity": 25, "operation_timeout_ms": null}}}}"#
    )
    .unwrap();

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.pipeline.flow_history_capacity, 25);
    assert_eq!(config.pipeline.operation_timeout(), None);
}

#[test]
fn test_unknown_extension_rejected() {
    let file = Builder::new().suffix(".yaml").tempfile().unwrap();
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn test_invalid_file_fails_validation() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[performance]\nstats_interval = 0").unwrap();

    let err = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_dotenv_path_missing_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::new().with_dotenv_path(dir.path().join(".env"));
    assert!(matches!(result, Err(ConfigError::Dotenv(_))));
}
