//! Prometheus metrics for Liaison.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `liaison_operations_total` | Counter | `controller`, `operation`, `status` | Completed operations |
//! | `liaison_operation_duration_seconds` | Histogram | `controller`, `operation` | Operation latency |
//! | `liaison_cache_lookups_total` | Counter | `result` | Cache hits and misses |
//!
//! Recording functions are safe to call before [`init_metrics`]; the
//! `metrics` facade drops samples when no recorder is installed.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names.
pub mod names {
    /// Completed operations counter.
    pub const OPERATIONS_TOTAL: &str = "liaison_operations_total";
    /// Operation duration histogram.
    pub const OPERATION_DURATION: &str = "liaison_operation_duration_seconds";
    /// Cache lookup counter.
    pub const CACHE_LOOKUPS_TOTAL: &str = "liaison_cache_lookups_total";
}

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,

    /// Histogram buckets for operation duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 5ms .. 30s, client-side operations include network round trips
            duration_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// No HTTP listener is started; use [`render_metrics`] to read the
/// exposition text (for a debug screen or a diagnostics upload).
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are invalid or a
/// global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(names::OPERATION_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(
        names::OPERATIONS_TOTAL,
        "Total number of controller operations completed"
    );
    describe_histogram!(
        names::OPERATION_DURATION,
        metrics::Unit::Seconds,
        "Controller operation duration in seconds"
    );
    describe_counter!(
        names::CACHE_LOOKUPS_TOTAL,
        "Total cache lookups by result"
    );
}

/// Records a completed operation.
///
/// Updates `liaison_operations_total` and
/// `liaison_operation_duration_seconds`.
pub fn record_operation(controller: &str, operation: &str, success: bool, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        names::OPERATIONS_TOTAL,
        "controller" => controller.to_string(),
        "operation" => operation.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        names::OPERATION_DURATION,
        "controller" => controller.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(names::CACHE_LOOKUPS_TOTAL, "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(!config.duration_buckets.is_empty());
        assert!(config
            .duration_buckets
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_record_functions_dont_panic() {
        record_operation("ChannelController", "createChannel", true, Duration::from_millis(10));
        record_operation("ChannelController", "createChannel", false, Duration::ZERO);
        record_cache_lookup(true);
        record_cache_lookup(false);
    }

    #[test]
    fn test_names() {
        assert_eq!(names::OPERATIONS_TOTAL, "liaison_operations_total");
        assert_eq!(names::CACHE_LOOKUPS_TOTAL, "liaison_cache_lookups_total");
    }
}
