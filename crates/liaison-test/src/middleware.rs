//! A middleware stage that records the hooks it sees.

use std::sync::Arc;

use liaison_core::{BoxFuture, OperationContext, OperationError, OperationResult};
use liaison_middleware::{HookError, Invocation, Middleware};
use parking_lot::Mutex;

/// Shared, ordered log of hook events.
///
/// Events read `"<stage>:<phase>:<Controller>.<operation>"`, so several
/// recording stages sharing one log show the order the chain ran them in.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events so far.
    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Drops every event.
    pub fn clear(&self) {
        self.0.lock().clear();
    }

    fn push(&self, stage: &str, phase: &str, invocation: Invocation<'_>) {
        self.0
            .lock()
            .push(format!("{stage}:{phase}:{}", invocation.key()));
    }
}

enum Fault {
    Fail(String),
    Reject(String),
}

/// Middleware that logs every hook into an [`EventLog`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use liaison_core::{FlowId, OperationContext, Params};
/// use liaison_middleware::MiddlewareChain;
/// use liaison_test::{EventLog, RecordingMiddleware};
///
/// # tokio_test::block_on(async {
/// let log = EventLog::new();
/// let chain = MiddlewareChain::new();
/// chain.add(Arc::new(RecordingMiddleware::new("late", 50, &log)));
/// chain.add(Arc::new(RecordingMiddleware::new("early", 1, &log)));
///
/// chain
///     .execute("C", "op", &Params::new(), OperationContext::new(FlowId::new()), || async {
///         Ok(serde_json::json!(true))
///     })
///     .await;
///
/// assert_eq!(
///     log.events(),
///     vec!["early:before:C.op", "late:before:C.op", "early:after:C.op", "late:after:C.op"]
/// );
/// # });
/// ```
pub struct RecordingMiddleware {
    name: String,
    priority: i32,
    log: EventLog,
    fault: Option<Fault>,
}

impl std::fmt::Debug for RecordingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingMiddleware")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl RecordingMiddleware {
    /// Creates a stage writing into `log`.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, log: &EventLog) -> Self {
        Self {
            name: name.into(),
            priority,
            log: log.clone(),
            fault: None,
        }
    }

    /// Makes `before` return a best-effort [`HookError::Failed`].
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fault = Some(Fault::Fail(message.into()));
        self
    }

    /// Makes `before` reject the operation.
    #[must_use]
    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.fault = Some(Fault::Reject(message.into()));
        self
    }
}

impl Middleware for RecordingMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn before<'a>(
        &'a self,
        invocation: Invocation<'a>,
        _ctx: &'a mut OperationContext,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        self.log.push(&self.name, "before", invocation);
        let outcome = match &self.fault {
            None => Ok(()),
            Some(Fault::Fail(message)) => Err(HookError::failed(message.clone())),
            Some(Fault::Reject(message)) => {
                Err(HookError::Rejected(OperationError::msg(message.clone())))
            }
        };
        Box::pin(async move { outcome })
    }

    fn after<'a>(
        &'a self,
        invocation: Invocation<'a>,
        _result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        self.log.push(&self.name, "after", invocation);
        Box::pin(async { Ok(()) })
    }

    fn on_error<'a>(
        &'a self,
        invocation: Invocation<'a>,
        _result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        self.log.push(&self.name, "on_error", invocation);
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liaison_core::{FlowId, Params};
    use liaison_middleware::MiddlewareChain;
    use serde_json::json;

    async fn run(chain: &MiddlewareChain) -> OperationResult {
        chain
            .execute(
                "UserController",
                "getCurrentUser",
                &Params::new(),
                OperationContext::new(FlowId::new()),
                || async { Ok(json!({ "id": "u1" })) },
            )
            .await
    }

    #[tokio::test]
    async fn test_failed_hook_does_not_stop_chain() {
        let log = EventLog::new();
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(RecordingMiddleware::new("a", 1, &log).failing("flaky")));
        chain.add(Arc::new(RecordingMiddleware::new("b", 2, &log)));

        assert!(run(&chain).await.is_success());
        assert_eq!(log.events().len(), 4);
    }

    #[tokio::test]
    async fn test_rejection_skips_later_before_hooks() {
        let log = EventLog::new();
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(RecordingMiddleware::new("a", 1, &log).rejecting("no")));
        chain.add(Arc::new(RecordingMiddleware::new("b", 2, &log)));

        let result = run(&chain).await;
        assert!(!result.is_success());
        assert_eq!(
            log.events(),
            vec![
                "a:before:UserController.getCurrentUser",
                "a:on_error:UserController.getCurrentUser",
                "b:on_error:UserController.getCurrentUser",
            ]
        );
    }
}
