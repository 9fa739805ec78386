//! Settings shared by every controller a registry builds.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use liaison_config::{CacheConfig, LiaisonConfig};
use liaison_core::flow::DEFAULT_HISTORY_CAPACITY;
use liaison_middleware::stages::{
    performance::{DEFAULT_SLOW_THRESHOLD, DEFAULT_STATS_INTERVAL},
    CachePolicy,
};
use liaison_telemetry::{LogLevel, Logger, RemoteSink};

/// Default operation timeout.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline settings applied to each controller.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use liaison_config::{CacheConfig, LiaisonConfig};
/// use liaison_controller::ControllerSettings;
///
/// let mut config = LiaisonConfig::default();
/// config.pipeline.operation_timeout_ms = Some(5_000);
///
/// let settings = ControllerSettings::from_config(&config);
/// assert_eq!(settings.operation_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Clone)]
pub struct ControllerSettings {
    /// Completed flows kept per controller.
    pub flow_history_capacity: usize,
    /// Upper bound on one operation, `None` for no limit.
    pub operation_timeout: Option<Duration>,
    /// Result cache TTLs.
    pub cache_policy: CachePolicy,
    /// Runs slower than this are logged as warnings.
    pub slow_threshold: Duration,
    /// Performance aggregates are logged every this many runs.
    pub stats_interval: u64,
    logger: Logger,
}

impl fmt::Debug for ControllerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerSettings")
            .field("flow_history_capacity", &self.flow_history_capacity)
            .field("operation_timeout", &self.operation_timeout)
            .field("cache_policy", &self.cache_policy)
            .field("slow_threshold", &self.slow_threshold)
            .field("stats_interval", &self.stats_interval)
            .field("logger", &self.logger)
            .finish()
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            flow_history_capacity: DEFAULT_HISTORY_CAPACITY,
            operation_timeout: Some(DEFAULT_OPERATION_TIMEOUT),
            cache_policy: cache_policy(&CacheConfig::default()),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            stats_interval: DEFAULT_STATS_INTERVAL,
            logger: Logger::new("liaison"),
        }
    }
}

impl ControllerSettings {
    /// Builds settings from a loaded configuration.
    ///
    /// The remote sink is not attached; see [`Self::from_config_with_sink`].
    #[must_use]
    pub fn from_config(config: &LiaisonConfig) -> Self {
        Self {
            flow_history_capacity: config.pipeline.flow_history_capacity,
            operation_timeout: config.pipeline.operation_timeout(),
            cache_policy: cache_policy(&config.cache),
            slow_threshold: config.performance.slow_threshold(),
            stats_interval: config.performance.stats_interval,
            logger: Logger::new(config.telemetry.service_name.clone()),
        }
    }

    /// Builds settings from a configuration and attaches `sink` when
    /// `telemetry.logging.remote_forwarding` is on.
    #[must_use]
    pub fn from_config_with_sink(config: &LiaisonConfig, sink: Arc<dyn RemoteSink>) -> Self {
        let settings = Self::from_config(config);
        let logging = &config.telemetry.logging;
        if logging.remote_forwarding {
            settings.with_remote_sink(sink, logging.remote_min_level)
        } else {
            settings
        }
    }

    /// Forwards log records at or above `min_level` to `sink`.
    #[must_use]
    pub fn with_remote_sink(mut self, sink: Arc<dyn RemoteSink>, min_level: LogLevel) -> Self {
        self.logger = self.logger.with_sink(sink, min_level);
        self
    }

    /// Sets the operation timeout.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Sets the cache policy.
    #[must_use]
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Sets the flow history capacity.
    #[must_use]
    pub fn with_flow_history_capacity(mut self, capacity: usize) -> Self {
        self.flow_history_capacity = capacity;
        self
    }

    /// Returns the root logger; controllers and stages derive theirs from it.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

fn cache_policy(cache: &CacheConfig) -> CachePolicy {
    CachePolicy::from_table(cache.default_ttl(), cache.ttl_table())
}
