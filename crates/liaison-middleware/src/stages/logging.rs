//! Operation logging middleware.
//!
//! Logs the start of every invocation with redacted parameters, its
//! completion with duration, and failures with their source chain.

use std::fmt;

use liaison_core::{BoxFuture, OperationContext, OperationResult};
use liaison_telemetry::Logger;
use serde_json::json;

use crate::middleware::{HookError, Invocation, Middleware};
use crate::sanitize::sanitize_map;

/// Stage name.
pub const NAME: &str = "LoggingMiddleware";

/// Stage priority.
pub const PRIORITY: i32 = 10;

/// Logs every invocation.
#[derive(Clone)]
pub struct LoggingMiddleware {
    logger: Logger,
}

impl fmt::Debug for LoggingMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingMiddleware")
            .field("logger", &self.logger)
            .finish()
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingMiddleware {
    /// Creates a stage with a local logger.
    #[must_use]
    pub fn new() -> Self {
        Self::with_logger(&Logger::new(NAME))
    }

    /// Creates a stage logging through `logger`'s sink.
    #[must_use]
    pub fn with_logger(logger: &Logger) -> Self {
        Self {
            logger: logger.for_component(NAME),
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn before<'a>(
        &'a self,
        invocation: Invocation<'a>,
        ctx: &'a mut OperationContext,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        self.logger.info(
            &format!("Starting {}", invocation.key()),
            json!({
                "flow_id": ctx.flow_id().to_string(),
                "user_id": ctx.user_id(),
                "params": sanitize_map(invocation.params.as_map()),
            }),
        );
        Box::pin(async { Ok(()) })
    }

    fn after<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        self.logger.info(
            &format!("Completed {}", invocation.key()),
            json!({
                "flow_id": result.flow_id().to_string(),
                "duration_ms": result.duration().as_secs_f64() * 1000.0,
                "success": result.is_success(),
            }),
        );
        Box::pin(async { Ok(()) })
    }

    fn on_error<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let fields = json!({
            "flow_id": result.flow_id().to_string(),
            "controller": invocation.controller,
            "operation": invocation.operation,
            "duration_ms": result.duration().as_secs_f64() * 1000.0,
        });
        match result.error() {
            Some(error) => self.logger.exception(error, fields),
            None => self
                .logger
                .error(&format!("Failed {}", invocation.key()), fields),
        }
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liaison_core::{FlowId, OperationError, Params};
    use liaison_telemetry::{LogLevel, LogRecord, SinkError};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    fn capturing() -> (Logger, Arc<Mutex<Vec<LogRecord>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        let logger = Logger::new("test").with_sink(
            Arc::new(move |record: &LogRecord| -> Result<(), SinkError> {
                sink.lock().push(record.clone());
                Ok(())
            }),
            LogLevel::Debug,
        );
        (logger, records)
    }

    #[tokio::test]
    async fn test_start_log_redacts_params() {
        let (logger, records) = capturing();
        let logging = LoggingMiddleware::with_logger(&logger);

        let params = Params::new()
            .with("email", "user@example.com")
            .with("password", "hunter22");
        let mut ctx = OperationContext::new(FlowId::new()).with_user_id("u1");
        logging
            .before(Invocation::new("UserController", "authenticateUser", &params), &mut ctx)
            .await
            .unwrap();

        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].component, NAME);
        assert_eq!(records[0].message, "Starting UserController.authenticateUser");
        assert_eq!(records[0].fields["params"]["password"], "[REDACTED]");
        assert_eq!(records[0].fields["params"]["email"], "user@example.com");
        assert_eq!(records[0].fields["user_id"], "u1");
    }

    #[tokio::test]
    async fn test_error_log_includes_chain() {
        let (logger, records) = capturing();
        let logging = LoggingMiddleware::with_logger(&logger);

        let params = Params::new();
        let mut result = OperationResult::failure(
            OperationError::status(503, "maintenance"),
            Duration::from_millis(12),
            OperationContext::new(FlowId::new()),
        );
        logging
            .on_error(Invocation::new("ChannelController", "createChannel", &params), &mut result)
            .await
            .unwrap();

        let records = records.lock();
        assert_eq!(records[0].level, LogLevel::Error);
        assert_eq!(records[0].fields["error"], "request failed with status 503: maintenance");
        assert_eq!(records[0].fields["operation"], "createChannel");
    }
}
