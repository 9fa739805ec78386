//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use liaison_telemetry::{LogConfig, LogLevel, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

fn default_true() -> bool {
    true
}

/// Pipeline configuration section.
///
/// # Example
///
/// ```
/// use liaison_config::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.flow_history_capacity, 1000);
/// assert_eq!(config.operation_timeout(), Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Completed flows kept per controller.
    #[serde(default = "default_flow_history_capacity")]
    pub flow_history_capacity: usize,

    /// Operation timeout in milliseconds. None disables the timeout.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flow_history_capacity: default_flow_history_capacity(),
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl PipelineConfig {
    /// Returns the operation timeout as a duration.
    #[must_use]
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

fn default_flow_history_capacity() -> usize {
    1000
}

#[allow(clippy::unnecessary_wraps)]
fn default_operation_timeout() -> Option<u64> {
    Some(30_000)
}

/// Result cache configuration section.
///
/// TTL keys are `"Controller:operation"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL for operations without an entry in `ttl_secs`.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Per-operation TTL overrides, in seconds.
    #[serde(default = "default_ttl_table")]
    pub ttl_secs: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            ttl_secs: default_ttl_table(),
        }
    }
}

impl CacheConfig {
    /// Returns the TTL table as durations.
    #[must_use]
    pub fn ttl_table(&self) -> BTreeMap<String, Duration> {
        self.ttl_secs
            .iter()
            .map(|(key, secs)| (key.clone(), Duration::from_secs(*secs)))
            .collect()
    }

    /// Returns the default TTL as a duration.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_ttl_table() -> BTreeMap<String, u64> {
    [
        ("UserController:getCurrentUser", 600),
        ("UserController:getUserProfile", 300),
        ("ChannelController:getChannels", 120),
        ("MessageController:getMessages", 60),
    ]
    .into_iter()
    .map(|(key, secs)| (key.to_string(), secs))
    .collect()
}

/// Performance tracking configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PerformanceConfig {
    /// Runs slower than this are logged as warnings.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,

    /// Aggregate snapshot is logged every this many runs per operation.
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            slow_threshold_ms: default_slow_threshold_ms(),
            stats_interval: default_stats_interval(),
        }
    }
}

impl PerformanceConfig {
    /// Returns the slow threshold as a duration.
    #[must_use]
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }
}

fn default_slow_threshold_ms() -> u64 {
    1000
}

fn default_stats_interval() -> u64 {
    10
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Forward records to the remote sink, when one is supplied.
    #[serde(default)]
    pub remote_forwarding: bool,

    /// Minimum level forwarded to the remote sink.
    #[serde(default = "default_remote_min_level")]
    pub remote_min_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
            remote_forwarding: false,
            remote_min_level: default_remote_min_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_remote_min_level() -> LogLevel {
    LogLevel::Warn
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for operation duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name used in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            metrics: MetricsSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TelemetrySection {
    /// Converts this section into the telemetry crate's configuration.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig::builder()
            .service_name(&self.service_name)
            .environment(&self.environment)
            .logging(LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                json_format: self.logging.format == LogFormat::Json,
                file_line_info: self.logging.include_location,
                ansi: self.logging.ansi_enabled,
                ..LogConfig::default()
            })
            .metrics(MetricsConfig {
                enabled: self.metrics.enabled,
                duration_buckets: self.metrics.histogram_buckets.clone(),
            })
            .build()
    }
}

fn default_service_name() -> String {
    "liaison-client".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}
