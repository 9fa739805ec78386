//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a [`RemoteSink`](crate::logger::RemoteSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink is not configured (missing DSN, app id, ...).
    #[error("remote sink is not configured")]
    NotConfigured,

    /// The sink refused or dropped the record.
    #[error("remote sink rejected record: {0}")]
    Rejected(String),

    /// Record could not be encoded.
    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
}
