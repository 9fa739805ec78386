//! Observability for Liaison.
//!
//! - **Logging**: `tracing-subscriber` setup with JSON or pretty output
//! - **Logger**: component-scoped structured logger with remote forwarding
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `liaison_operations_total` | Counter | `controller`, `operation`, `status` | Completed operations |
//! | `liaison_operation_duration_seconds` | Histogram | `controller`, `operation` | Operation latency |
//! | `liaison_cache_lookups_total` | Counter | `result` | Cache hits and misses |
//!
//! # Example
//!
//! ```rust,ignore
//! use liaison_telemetry::{TelemetryConfig, init_telemetry};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("coach-web")
//!     .environment("production")
//!     .build();
//!
//! init_telemetry(&config)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logger;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::{SinkError, TelemetryError};
pub use logger::{LogLevel, LogRecord, Logger, RemoteSink};
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if any subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "telemetry initialized"
    );
    Ok(())
}
