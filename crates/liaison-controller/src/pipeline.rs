//! Behaviour shared by every controller.
//!
//! [`ControllerCore`] owns one middleware chain (validation, logging,
//! performance, caching), one [`FlowTracker`] and the controller-level
//! counters. Concrete controllers embed it and route every public method
//! through [`ControllerCore::execute_with_tracking`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use liaison_core::{
    ClassifiedError, ErrorClassifier, FlowTracker, OperationContext, OperationError, Params,
};
use liaison_middleware::stages::{
    CachingMiddleware, LoggingMiddleware, PerformanceMiddleware, ValidationMiddleware,
    ValidationSchema,
};
use liaison_middleware::MiddlewareChain;
use liaison_telemetry::Logger;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::Instrument;

use crate::settings::ControllerSettings;

/// Controller-level operation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerMetrics {
    /// Finished operations.
    pub total_operations: u64,
    /// Operations that returned a payload.
    pub successful_operations: u64,
    /// Operations that failed.
    pub failed_operations: u64,
    /// Summed duration of the successful operations.
    pub total_duration: Duration,
    /// When the last operation finished.
    pub last_operation_time: Option<DateTime<Utc>>,
}

impl ControllerMetrics {
    /// Returns `total_duration / total_operations`.
    ///
    /// Failed operations count in the denominator only.
    #[must_use]
    pub fn average_duration(&self) -> Duration {
        if self.total_operations == 0 {
            return Duration::ZERO;
        }
        match u32::try_from(self.total_operations) {
            Ok(count) => self.total_duration / count,
            Err(_) => self.total_duration.div_f64(self.total_operations as f64),
        }
    }
}

/// Snapshot of a controller's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerInfo {
    /// Controller name.
    pub name: String,
    /// Flows in flight.
    pub active_flows: usize,
    /// Completed flows kept in history.
    pub total_flows: usize,
    /// Percentage of completed flows that succeeded.
    pub success_rate: f64,
    /// Whether the controller is initialized.
    pub initialized: bool,
    /// Last initialization or operation.
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug)]
struct CoreState {
    initialized: bool,
    last_activity: DateTime<Utc>,
    metrics: ControllerMetrics,
}

/// The pipeline and bookkeeping behind one controller.
pub struct ControllerCore {
    name: String,
    logger: Logger,
    chain: MiddlewareChain,
    validation: Arc<ValidationMiddleware>,
    performance: Arc<PerformanceMiddleware>,
    caching: Arc<CachingMiddleware>,
    flows: FlowTracker,
    classifier: ErrorClassifier,
    timeout: Option<Duration>,
    state: Mutex<CoreState>,
}

impl fmt::Debug for ControllerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerCore")
            .field("name", &self.name)
            .field("chain", &self.chain)
            .field("timeout", &self.timeout)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl ControllerCore {
    /// Creates a core with the four standard stages.
    pub fn new(name: impl Into<String>, settings: &ControllerSettings) -> Self {
        let name = name.into();
        let root = settings.logger();

        let validation = Arc::new(ValidationMiddleware::with_logger(root));
        let performance = Arc::new(PerformanceMiddleware::with_settings(
            settings.slow_threshold,
            settings.stats_interval,
            root,
        ));
        let caching = Arc::new(CachingMiddleware::with_logger(settings.cache_policy.clone(), root));

        let chain = MiddlewareChain::new();
        chain.add(validation.clone());
        chain.add(Arc::new(LoggingMiddleware::with_logger(root)));
        chain.add(performance.clone());
        chain.add(caching.clone());

        Self {
            logger: root.for_component(name.clone()),
            name,
            chain,
            validation,
            performance,
            caching,
            flows: FlowTracker::with_capacity(settings.flow_history_capacity),
            classifier: ErrorClassifier::new(),
            timeout: settings.operation_timeout,
            state: Mutex::new(CoreState {
                initialized: false,
                last_activity: Utc::now(),
                metrics: ControllerMetrics::default(),
            }),
        }
    }

    /// Registers this controller's validation rules.
    #[must_use]
    pub fn with_schema(self, schema: ValidationSchema) -> Self {
        self.validation.add_schema(self.name.clone(), schema);
        self
    }

    /// Returns the controller name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the controller's logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Returns the middleware chain.
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Returns the validation stage.
    pub fn validation(&self) -> &ValidationMiddleware {
        &self.validation
    }

    /// Returns the performance stage.
    pub fn performance(&self) -> &PerformanceMiddleware {
        &self.performance
    }

    /// Returns the caching stage.
    pub fn caching(&self) -> &CachingMiddleware {
        &self.caching
    }

    /// Returns the flow tracker.
    pub fn flows(&self) -> &FlowTracker {
        &self.flows
    }

    /// Returns the operation timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Marks the controller initialized. Repeated calls are no-ops.
    pub fn initialize(&self) {
        {
            let mut state = self.state.lock();
            if state.initialized {
                return;
            }
            state.initialized = true;
            state.last_activity = Utc::now();
        }
        self.logger.info(
            "Initializing controller",
            json!({ "middleware": self.chain.middleware_names() }),
        );
    }

    /// Marks the controller inactive.
    pub fn cleanup(&self) {
        self.state.lock().initialized = false;
        self.logger.info("Controller cleaned up", json!({}));
    }

    /// Returns whether the controller is initialized.
    pub fn is_active(&self) -> bool {
        self.state.lock().initialized
    }

    /// Returns the operation counters.
    pub fn metrics(&self) -> ControllerMetrics {
        self.state.lock().metrics.clone()
    }

    /// Returns a state snapshot.
    pub fn info(&self) -> ControllerInfo {
        let (initialized, last_activity) = {
            let state = self.state.lock();
            (state.initialized, state.last_activity)
        };
        ControllerInfo {
            name: self.name.clone(),
            active_flows: self.flows.active_count(),
            total_flows: self.flows.total_flows(),
            success_rate: self.flows.success_rate(),
            initialized,
            last_activity,
        }
    }

    /// Runs `operation_fn` through the chain under a new flow.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of validation, the operation, the
    /// timeout, or payload decoding.
    pub async fn execute_with_tracking<P, T, F, Fut>(
        &self,
        operation: &str,
        params: &P,
        operation_fn: F,
    ) -> Result<T, ClassifiedError>
    where
        P: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        self.execute_as(None, operation, params, operation_fn).await
    }

    /// Like [`Self::execute_with_tracking`], attributing the flow to `user_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute_with_tracking`].
    pub async fn execute_as<P, T, F, Fut>(
        &self,
        user_id: Option<&str>,
        operation: &str,
        params: &P,
        operation_fn: F,
    ) -> Result<T, ClassifiedError>
    where
        P: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        self.initialize();

        let mut metadata = BTreeMap::new();
        if let Some(user_id) = user_id {
            metadata.insert("user_id".to_string(), user_id.to_string());
        }
        let flow_id = self.flows.start_flow(&self.name, operation, metadata);
        let mut context = OperationContext::new(flow_id)
            .with_metadata("controller", self.name.as_str())
            .with_metadata("operation", operation);
        if let Some(user_id) = user_id {
            context = context.with_user_id(user_id);
        }

        let span = tracing::info_span!(
            "controller_operation",
            controller = %self.name,
            operation,
            flow_id = %flow_id,
        );

        let params = Params::from_typed(params);
        let outcome = async {
            let params = params?;
            let timeout = self.timeout;
            let result = self
                .chain
                .execute(&self.name, operation, &params, context, move || async move {
                    let output = match timeout {
                        Some(limit) => tokio::time::timeout(limit, operation_fn())
                            .await
                            .map_err(|_| OperationError::Timeout(limit))??,
                        None => operation_fn().await?,
                    };
                    Ok::<Value, OperationError>(serde_json::to_value(output)?)
                })
                .await;

            let duration = result.duration();
            let payload = result.into_outcome()?;
            let output: T = serde_json::from_value(payload)?;
            Ok::<_, OperationError>((output, duration))
        }
        .instrument(span)
        .await;

        match outcome {
            Ok((output, duration)) => {
                self.record(Some(duration));
                self.flows.complete_flow(flow_id, true, None);
                Ok(output)
            }
            Err(error) => {
                self.record(None);
                self.flows.complete_flow(flow_id, false, Some(error.to_string()));
                Err(self.classifier.classify(error, &self.name, operation))
            }
        }
    }

    fn record(&self, success: Option<Duration>) {
        let now = Utc::now();
        let mut state = self.state.lock();
        state.last_activity = now;
        let metrics = &mut state.metrics;
        metrics.total_operations += 1;
        metrics.last_operation_time = Some(now);
        match success {
            Some(duration) => {
                metrics.successful_operations += 1;
                metrics.total_duration += duration;
            }
            None => metrics.failed_operations += 1,
        }
    }
}
