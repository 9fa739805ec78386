//! Performance tracking middleware.
//!
//! Folds every successful run into a per-`controller.operation` aggregate,
//! emits the `liaison_operations_total` and
//! `liaison_operation_duration_seconds` metrics, warns about slow runs and
//! periodically logs the aggregate.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use liaison_core::{BoxFuture, OperationContext, OperationResult};
use liaison_telemetry::{metrics::record_operation, Logger};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tokio::time::Instant;

use crate::middleware::{HookError, Invocation, Middleware};

/// Stage name.
pub const NAME: &str = "PerformanceMiddleware";

/// Stage priority.
pub const PRIORITY: i32 = 20;

/// Runs slower than this are logged as warnings by default.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(1000);

/// The aggregate is logged every this many runs by default.
pub const DEFAULT_STATS_INTERVAL: u64 = 10;

/// Start instant recorded by the before hook.
#[derive(Debug, Clone, Copy)]
struct StartedAt(Instant);

/// Aggregated timing of one `controller.operation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSample {
    /// Completed runs.
    pub count: u64,
    /// Sum of run durations.
    pub total: Duration,
    /// Fastest run.
    pub min: Duration,
    /// Slowest run.
    pub max: Duration,
    /// When the last run completed.
    pub last_run: DateTime<Utc>,
}

impl PerformanceSample {
    fn first(duration: Duration) -> Self {
        Self {
            count: 1,
            total: duration,
            min: duration,
            max: duration,
            last_run: Utc::now(),
        }
    }

    fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total += duration;
        self.min = self.min.min(duration);
        self.max = self.max.max(duration);
        self.last_run = Utc::now();
    }

    /// Returns `total / count`.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        match u32::try_from(self.count) {
            Ok(count) => self.total / count,
            Err(_) => self.total.div_f64(self.count as f64),
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Tracks operation timings.
pub struct PerformanceMiddleware {
    slow_threshold: Duration,
    stats_interval: u64,
    samples: Mutex<HashMap<String, PerformanceSample>>,
    logger: Logger,
}

impl fmt::Debug for PerformanceMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceMiddleware")
            .field("slow_threshold", &self.slow_threshold)
            .field("stats_interval", &self.stats_interval)
            .finish_non_exhaustive()
    }
}

impl Default for PerformanceMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMiddleware {
    /// Creates a tracker with the default threshold and interval.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_SLOW_THRESHOLD, DEFAULT_STATS_INTERVAL, &Logger::new(NAME))
    }

    /// Creates a tracker with explicit settings.
    ///
    /// An interval of zero is treated as one.
    #[must_use]
    pub fn with_settings(slow_threshold: Duration, stats_interval: u64, logger: &Logger) -> Self {
        Self {
            slow_threshold,
            stats_interval: stats_interval.max(1),
            samples: Mutex::new(HashMap::new()),
            logger: logger.for_component(NAME),
        }
    }

    /// Returns the aggregate for one operation.
    pub fn sample(&self, controller: &str, operation: &str) -> Option<PerformanceSample> {
        self.samples
            .lock()
            .get(&format!("{controller}.{operation}"))
            .cloned()
    }

    /// Returns every aggregate keyed by `controller.operation`.
    pub fn samples(&self) -> BTreeMap<String, PerformanceSample> {
        self.samples
            .lock()
            .iter()
            .map(|(key, sample)| (key.clone(), sample.clone()))
            .collect()
    }

    /// Drops every aggregate.
    pub fn clear(&self) {
        self.samples.lock().clear();
        self.logger.info("Performance metrics cleared", json!({}));
    }

    fn fold(&self, key: &str, duration: Duration) -> PerformanceSample {
        let mut samples = self.samples.lock();
        let sample = samples
            .entry(key.to_string())
            .and_modify(|sample| sample.record(duration))
            .or_insert_with(|| PerformanceSample::first(duration));
        sample.clone()
    }
}

impl Middleware for PerformanceMiddleware {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn before<'a>(
        &'a self,
        _invocation: Invocation<'a>,
        ctx: &'a mut OperationContext,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        ctx.set_extension(StartedAt(Instant::now()));
        Box::pin(async { Ok(()) })
    }

    fn after<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        result.context_mut().remove_extension::<StartedAt>();

        let key = invocation.key();
        let duration = result.duration();
        let sample = self.fold(&key, duration);
        record_operation(invocation.controller, invocation.operation, true, duration);

        if duration > self.slow_threshold {
            self.logger.warn(
                &format!("Slow operation detected: {key} took {:.2}ms", millis(duration)),
                json!({
                    "flow_id": result.flow_id().to_string(),
                    "duration_ms": millis(duration),
                    "average_ms": millis(sample.average()),
                    "count": sample.count,
                }),
            );
        }

        if sample.count % self.stats_interval == 0 {
            self.logger.info(
                &format!("Performance stats for {key}"),
                json!({
                    "count": sample.count,
                    "average_ms": millis(sample.average()),
                    "min_ms": millis(sample.min),
                    "max_ms": millis(sample.max),
                    "last_run": sample.last_run,
                }),
            );
        }

        Box::pin(async { Ok(()) })
    }

    fn on_error<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let started = result.context_mut().remove_extension::<StartedAt>();
        let elapsed = started.map_or_else(|| result.duration(), |StartedAt(at)| at.elapsed());
        record_operation(invocation.controller, invocation.operation, false, elapsed);

        if started.is_some() {
            self.logger.error(
                &format!("Operation failed with performance impact: {}", invocation.key()),
                json!({
                    "flow_id": result.flow_id().to_string(),
                    "duration_ms": millis(elapsed),
                    "error": result.error().map(ToString::to_string),
                }),
            );
        }

        Box::pin(async { Ok(()) })
    }
}
