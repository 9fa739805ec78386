//! Main configuration types.
//!
//! This module provides the top-level [`LiaisonConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, ConfigError, PerformanceConfig, PipelineConfig, TelemetrySection};

/// Complete Liaison configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use liaison_config::LiaisonConfig;
///
/// let config = LiaisonConfig::default();
/// assert_eq!(config.cache.default_ttl_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LiaisonConfig {
    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,

    /// Pipeline configuration (flow history, timeout).
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Result cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Performance tracking configuration.
    #[serde(default)]
    pub performance: PerformanceConfig,
}

impl LiaisonConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> LiaisonConfigBuilder {
        LiaisonConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the log level is not a valid filter directive
    /// - the flow history capacity is zero
    /// - the operation timeout is zero (use `None` to disable it)
    /// - a cache TTL is zero or a TTL key is not `Controller:operation`
    /// - the performance stats interval is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.logging.enabled {
            liaison_telemetry::logging::create_env_filter(&self.telemetry.logging.level)
                .map_err(|e| ConfigError::invalid_value("telemetry.logging.level", e.to_string()))?;
        }

        if self.pipeline.flow_history_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.flow_history_capacity",
                "must be greater than zero",
            ));
        }

        if self.pipeline.operation_timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "pipeline.operation_timeout_ms",
                "must be greater than zero, omit it to disable the timeout",
            ));
        }

        if self.cache.default_ttl_secs == 0 {
            return Err(ConfigError::invalid_value(
                "cache.default_ttl_secs",
                "must be greater than zero",
            ));
        }

        for (key, secs) in &self.cache.ttl_secs {
            let well_formed = key
                .split_once(':')
                .is_some_and(|(controller, operation)| !controller.is_empty() && !operation.is_empty());
            if !well_formed {
                return Err(ConfigError::invalid_value(
                    format!("cache.ttl_secs.{key}"),
                    "key must be 'Controller:operation'",
                ));
            }
            if *secs == 0 {
                return Err(ConfigError::invalid_value(
                    format!("cache.ttl_secs.{key}"),
                    "must be greater than zero",
                ));
            }
        }

        if self.performance.stats_interval == 0 {
            return Err(ConfigError::invalid_value(
                "performance.stats_interval",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors
    /// - Debug log level
    /// - No remote log forwarding
    ///
    /// # Example
    ///
    /// ```
    /// use liaison_config::LiaisonConfig;
    ///
    /// let config = LiaisonConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = crate::LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;
        config.telemetry.logging.remote_forwarding = false;
        config.telemetry.environment = "development".to_string();

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting
    /// - Info log level
    /// - Warnings and errors forwarded to the remote sink
    ///
    /// # Example
    ///
    /// ```
    /// use liaison_config::LiaisonConfig;
    ///
    /// let config = LiaisonConfig::production();
    /// assert_eq!(config.telemetry.logging.format, liaison_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = crate::LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config.telemetry.logging.remote_forwarding = true;
        config.telemetry.environment = "production".to_string();

        config
    }
}

/// Builder for [`LiaisonConfig`].
#[derive(Debug, Default)]
pub struct LiaisonConfigBuilder {
    telemetry: Option<TelemetrySection>,
    pipeline: Option<PipelineConfig>,
    cache: Option<CacheConfig>,
    performance: Option<PerformanceConfig>,
}

impl LiaisonConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the cache configuration.
    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the performance configuration.
    #[must_use]
    pub fn performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = Some(performance);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> LiaisonConfig {
        LiaisonConfig {
            telemetry: self.telemetry.unwrap_or_default(),
            pipeline: self.pipeline.unwrap_or_default(),
            cache: self.cache.unwrap_or_default(),
            performance: self.performance.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<LiaisonConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
