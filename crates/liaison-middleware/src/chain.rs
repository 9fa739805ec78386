//! Priority-ordered middleware chain.
//!
//! The chain wraps a single operation with every registered stage:
//!
//! ```text
//! before(stage 1) → before(stage 2) → … → operation
//!                                            │
//!             success: after(stage 1 … n) ◄──┤
//!             failure: on_error(stage 1 … n) ◄┘
//! ```
//!
//! Failures never escape [`MiddlewareChain::execute`]; they come back as a
//! failed [`OperationResult`] for the caller to translate.

use std::future::Future;
use std::sync::Arc;

use liaison_core::{OperationContext, OperationError, OperationResult, Params};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::Instant;

use crate::middleware::{HookError, Invocation, Middleware};

/// A type-erased middleware that can be stored in the chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

#[derive(Clone, Copy)]
enum Phase {
    Before,
    After,
    OnError,
}

impl Phase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::OnError => "on_error",
        }
    }
}

/// An ordered, mutable list of middleware stages.
///
/// Stages run in ascending priority; stages with equal priority keep the
/// order they were added in. Each call to [`execute`](Self::execute) works
/// on a snapshot, so stages added or removed concurrently only affect later
/// invocations.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use liaison_core::{FlowId, OperationContext, Params};
/// use liaison_middleware::{FnMiddleware, MiddlewareChain};
///
/// # tokio_test_block_on(async {
/// let chain = MiddlewareChain::new();
/// chain.add(Arc::new(FnMiddleware::new("Second", 20)));
/// chain.add(Arc::new(FnMiddleware::new("First", 10)));
/// assert_eq!(chain.middleware_names(), vec!["First", "Second"]);
///
/// let result = chain
///     .execute(
///         "UserController",
///         "getCurrentUser",
///         &Params::new(),
///         OperationContext::new(FlowId::new()),
///         || async { Ok(serde_json::json!({ "id": "u1" })) },
///     )
///     .await;
/// assert!(result.is_success());
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Default)]
pub struct MiddlewareChain {
    stages: RwLock<Vec<BoxedMiddleware>>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.middleware_names())
            .finish()
    }
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stage, keeping the chain sorted by priority.
    ///
    /// Duplicates are allowed and coexist.
    pub fn add(&self, middleware: BoxedMiddleware) {
        let name = middleware.name().to_string();
        let priority = middleware.priority();
        {
            let mut stages = self.stages.write();
            stages.push(middleware);
            // `sort_by_key` is stable, so equal priorities keep insertion order.
            stages.sort_by_key(|m| m.priority());
        }
        tracing::info!(middleware = %name, priority, "middleware added");
    }

    /// Removes the first stage with the given name.
    ///
    /// Returns `true` if a stage was removed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut stages = self.stages.write();
            stages
                .iter()
                .position(|m| m.name() == name)
                .map(|index| stages.remove(index))
        };
        if removed.is_some() {
            tracing::info!(middleware = %name, "middleware removed");
        }
        removed.is_some()
    }

    /// Removes every stage.
    pub fn clear(&self) {
        self.stages.write().clear();
        tracing::info!("middleware chain cleared");
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<String> {
        self.stages
            .read()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    /// Returns true if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Runs `operation_fn` wrapped by every stage.
    ///
    /// The reported duration covers the `before` hooks and the operation.
    /// A cache short-circuit marker left on the context does not skip the
    /// operation; the stage that left it rewrites the result afterwards.
    pub async fn execute<F, Fut>(
        &self,
        controller: &str,
        operation: &str,
        params: &Params,
        mut context: OperationContext,
        operation_fn: F,
    ) -> OperationResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, OperationError>>,
    {
        let stages: Vec<BoxedMiddleware> = self.stages.read().clone();
        let invocation = Invocation::new(controller, operation, params);
        let start = Instant::now();

        let mut rejection = None;
        for stage in &stages {
            match stage.before(invocation, &mut context).await {
                Ok(()) => {}
                Err(HookError::Rejected(error)) => {
                    tracing::debug!(
                        middleware = stage.name(),
                        controller,
                        operation,
                        "operation rejected before execution"
                    );
                    rejection = Some(error);
                    break;
                }
                Err(HookError::Failed(message)) => {
                    log_hook_failure(stage.as_ref(), Phase::Before, &invocation, &message);
                }
            }
        }

        let outcome = match rejection {
            Some(error) => Err(error),
            None => operation_fn().await,
        };
        let mut result = OperationResult::new(outcome, start.elapsed(), context);

        let phase = if result.is_success() {
            Phase::After
        } else {
            Phase::OnError
        };
        for stage in &stages {
            let hook = match phase {
                Phase::After => stage.after(invocation, &mut result),
                _ => stage.on_error(invocation, &mut result),
            };
            match hook.await {
                Ok(()) => {}
                Err(HookError::Failed(message)) => {
                    log_hook_failure(stage.as_ref(), phase, &invocation, &message);
                }
                Err(HookError::Rejected(error)) => {
                    log_hook_failure(stage.as_ref(), phase, &invocation, &error.to_string());
                }
            }
        }

        result
    }
}

fn log_hook_failure(stage: &dyn Middleware, phase: Phase, invocation: &Invocation<'_>, message: &str) {
    tracing::error!(
        middleware = stage.name(),
        hook = phase.as_str(),
        controller = invocation.controller,
        operation = invocation.operation,
        error = %message,
        "middleware hook failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use liaison_core::FlowId;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> OperationContext {
        OperationContext::new(FlowId::new())
    }

    fn recorder(name: &'static str, priority: i32, log: &Arc<Mutex<Vec<String>>>) -> BoxedMiddleware {
        let before = Arc::clone(log);
        let after = Arc::clone(log);
        let on_error = Arc::clone(log);
        Arc::new(
            FnMiddleware::new(name, priority)
                .before(move |_, _| {
                    before.lock().push(format!("{name}:before"));
                    Ok(())
                })
                .after(move |_, _| {
                    after.lock().push(format!("{name}:after"));
                    Ok(())
                })
                .on_error(move |_, _| {
                    on_error.lock().push(format!("{name}:on_error"));
                    Ok(())
                }),
        )
    }

    #[test]
    fn test_add_sorts_by_priority_stably() {
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(FnMiddleware::new("c", 30)));
        chain.add(Arc::new(FnMiddleware::new("a1", 10)));
        chain.add(Arc::new(FnMiddleware::new("b", 20)));
        chain.add(Arc::new(FnMiddleware::new("a2", 10)));

        assert_eq!(chain.middleware_names(), vec!["a1", "a2", "b", "c"]);
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn test_remove_first_match_only() {
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(FnMiddleware::new("dup", 1)));
        chain.add(Arc::new(FnMiddleware::new("dup", 2)));

        assert!(chain.remove("dup"));
        assert_eq!(chain.len(), 1);
        assert!(chain.remove("dup"));
        assert!(!chain.remove("dup"));
        assert!(chain.is_empty());
    }

    #[test]
    fn test_clear() {
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(FnMiddleware::new("a", 1)));
        chain.clear();
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_success_runs_before_then_after() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new();
        chain.add(recorder("second", 20, &log));
        chain.add(recorder("first", 10, &log));

        let op_log = Arc::clone(&log);
        let result = chain
            .execute("C", "op", &Params::new(), ctx(), || async move {
                op_log.lock().push("op".to_string());
                Ok(json!("done"))
            })
            .await;

        assert!(result.is_success());
        assert_eq!(result.payload(), Some(&json!("done")));
        assert_eq!(
            *log.lock(),
            vec![
                "first:before",
                "second:before",
                "op",
                "first:after",
                "second:after"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_runs_on_error_and_returns_failed_result() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new();
        chain.add(recorder("only", 1, &log));

        let result = chain
            .execute("C", "op", &Params::new(), ctx(), || async {
                Err(OperationError::status(500, "boom"))
            })
            .await;

        assert!(!result.is_success());
        assert_eq!(result.error().and_then(OperationError::status_code), Some(500));
        assert_eq!(*log.lock(), vec!["only:before", "only:on_error"]);
    }

    #[tokio::test]
    async fn test_failed_hooks_are_best_effort() {
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(
            FnMiddleware::new("Broken", 1)
                .before(|_, _| Err(HookError::failed("before broke")))
                .after(|_, _| Err(HookError::failed("after broke"))),
        ));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let result = chain
            .execute("C", "op", &Params::new(), ctx(), || async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!(true))
            })
            .await;

        assert!(result.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_skips_operation_and_later_before_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(
            FnMiddleware::new("Gate", 5)
                .before(|_, _| Err(HookError::Rejected(OperationError::msg("closed")))),
        ));
        chain.add(recorder("later", 10, &log));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let result = chain
            .execute("C", "op", &Params::new(), ctx(), || async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!(true))
            })
            .await;

        assert!(!result.is_success());
        assert_eq!(result.error().map(ToString::to_string).as_deref(), Some("closed"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*log.lock(), vec!["later:on_error"]);
    }

    #[tokio::test]
    async fn test_after_hook_rejection_does_not_flip_success() {
        let chain = MiddlewareChain::new();
        chain.add(Arc::new(
            FnMiddleware::new("Late", 1)
                .after(|_, _| Err(HookError::Rejected(OperationError::msg("too late")))),
        ));

        let result = chain
            .execute("C", "op", &Params::new(), ctx(), || async { Ok(json!(1)) })
            .await;
        assert!(result.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_covers_operation() {
        let chain = MiddlewareChain::new();
        let result = chain
            .execute("C", "op", &Params::new(), ctx(), || async {
                tokio::time::sleep(std::time::Duration::from_millis(250)).await;
                Ok(json!(null))
            })
            .await;

        assert_eq!(result.duration(), std::time::Duration::from_millis(250));
    }
}
