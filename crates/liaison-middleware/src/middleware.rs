//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every chain stage
//! implements. A stage contributes up to three hooks around a wrapped
//! operation:
//!
//! - `before` runs ahead of the operation and may annotate the context
//! - `after` runs once the operation succeeded and may rewrite the result
//! - `on_error` runs once the operation (or a validation stage) failed
//!
//! Every hook is optional. Hook failures follow the best-effort policy
//! described on [`HookError`].
//!
//! # Example
//!
//! ```
//! use liaison_core::{BoxFuture, OperationContext};
//! use liaison_middleware::{HookError, Invocation, Middleware};
//!
//! struct AuditMiddleware;
//!
//! impl Middleware for AuditMiddleware {
//!     fn name(&self) -> &str {
//!         "AuditMiddleware"
//!     }
//!
//!     fn priority(&self) -> i32 {
//!         40
//!     }
//!
//!     fn before<'a>(
//!         &'a self,
//!         invocation: Invocation<'a>,
//!         _ctx: &'a mut OperationContext,
//!     ) -> BoxFuture<'a, Result<(), HookError>> {
//!         Box::pin(async move {
//!             println!("calling {}", invocation.key());
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use liaison_core::{BoxFuture, OperationContext, OperationError, OperationResult, Params};
use thiserror::Error;

/// Errors returned by middleware hooks.
///
/// The chain treats the two variants differently:
///
/// - [`HookError::Failed`] is best-effort: the chain logs it at error level
///   and carries on with the next hook as if nothing happened.
/// - [`HookError::Rejected`] is a hard short-circuit, honored only from
///   `before` hooks: the remaining `before` hooks and the wrapped operation
///   are skipped, and the carried error becomes the invocation's failure.
///   Returned from `after` or `on_error` it degrades to a logged failure.
#[derive(Error, Debug)]
pub enum HookError {
    /// The hook failed; the chain logs it and continues.
    #[error("hook failed: {0}")]
    Failed(String),

    /// The hook refuses to let the operation run.
    #[error("operation rejected: {0}")]
    Rejected(OperationError),
}

impl HookError {
    /// Creates a best-effort failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// The operation a hook is being invoked for.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Name of the owning controller, e.g. `ChannelController`.
    pub controller: &'a str,
    /// Name of the operation, e.g. `createChannel`.
    pub operation: &'a str,
    /// Parameters the operation was called with.
    pub params: &'a Params,
}

impl<'a> Invocation<'a> {
    /// Creates an invocation descriptor.
    #[must_use]
    pub const fn new(controller: &'a str, operation: &'a str, params: &'a Params) -> Self {
        Self {
            controller,
            operation,
            params,
        }
    }

    /// Returns `"controller.operation"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}.{}", self.controller, self.operation)
    }
}

/// A stage in the middleware chain.
///
/// Stages are ordered by ascending [`priority`](Middleware::priority); ties
/// keep insertion order.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used for removal and logging.
    fn name(&self) -> &str;

    /// Returns the priority of this stage. Lower runs first.
    fn priority(&self) -> i32;

    /// Runs before the wrapped operation.
    fn before<'a>(
        &'a self,
        invocation: Invocation<'a>,
        ctx: &'a mut OperationContext,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let _ = (invocation, ctx);
        Box::pin(async { Ok(()) })
    }

    /// Runs after the wrapped operation succeeded.
    fn after<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let _ = (invocation, result);
        Box::pin(async { Ok(()) })
    }

    /// Runs after the wrapped operation (or a rejecting stage) failed.
    fn on_error<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let _ = (invocation, result);
        Box::pin(async { Ok(()) })
    }
}

type BeforeFn =
    Box<dyn Fn(Invocation<'_>, &mut OperationContext) -> Result<(), HookError> + Send + Sync>;
type ResultFn =
    Box<dyn Fn(Invocation<'_>, &mut OperationResult) -> Result<(), HookError> + Send + Sync>;

/// A middleware assembled from synchronous closures.
///
/// This allows defining simple stages without implementing the trait
/// directly.
///
/// # Example
///
/// ```
/// use liaison_middleware::{FnMiddleware, HookError};
///
/// let deny_guests = FnMiddleware::new("GuestGuard", 1).before(|_inv, ctx| {
///     if ctx.user_id().is_none() {
///         return Err(HookError::failed("anonymous call"));
///     }
///     Ok(())
/// });
/// ```
pub struct FnMiddleware {
    name: String,
    priority: i32,
    before: Option<BeforeFn>,
    after: Option<ResultFn>,
    on_error: Option<ResultFn>,
}

impl FnMiddleware {
    /// Creates a function-based middleware with no hooks.
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            before: None,
            after: None,
            on_error: None,
        }
    }

    /// Sets the before hook.
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(Invocation<'_>, &mut OperationContext) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    /// Sets the after hook.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(Invocation<'_>, &mut OperationResult) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }

    /// Sets the error hook.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Invocation<'_>, &mut OperationResult) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl Middleware for FnMiddleware {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn before<'a>(
        &'a self,
        invocation: Invocation<'a>,
        ctx: &'a mut OperationContext,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let outcome = self.before.as_ref().map_or(Ok(()), |f| f(invocation, ctx));
        Box::pin(async move { outcome })
    }

    fn after<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let outcome = self.after.as_ref().map_or(Ok(()), |f| f(invocation, result));
        Box::pin(async move { outcome })
    }

    fn on_error<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        let outcome = self
            .on_error
            .as_ref()
            .map_or(Ok(()), |f| f(invocation, result));
        Box::pin(async move { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liaison_core::FlowId;
    use std::time::Duration;

    struct Quiet;

    impl Middleware for Quiet {
        fn name(&self) -> &str {
            "Quiet"
        }

        fn priority(&self) -> i32 {
            0
        }
    }

    #[tokio::test]
    async fn test_default_hooks_are_noops() {
        let params = Params::new();
        let inv = Invocation::new("UserController", "getCurrentUser", &params);
        let mut ctx = OperationContext::new(FlowId::new());

        assert!(Quiet.before(inv, &mut ctx).await.is_ok());

        let mut result =
            OperationResult::success(serde_json::json!(1), Duration::ZERO, ctx);
        assert!(Quiet.after(inv, &mut result).await.is_ok());
        assert!(Quiet.on_error(inv, &mut result).await.is_ok());
    }

    #[tokio::test]
    async fn test_fn_middleware_before() {
        let mw = FnMiddleware::new("Tagger", 3).before(|inv, ctx| {
            ctx.set_extension(inv.operation.to_string());
            Ok(())
        });

        let params = Params::new();
        let mut ctx = OperationContext::new(FlowId::new());
        Middleware::before(&mw, Invocation::new("C", "op", &params), &mut ctx)
            .await
            .unwrap();

        assert_eq!(mw.name(), "Tagger");
        assert_eq!(mw.priority(), 3);
        assert_eq!(ctx.get_extension::<String>().map(String::as_str), Some("op"));
    }

    #[test]
    fn test_invocation_key() {
        let params = Params::new();
        let inv = Invocation::new("MessageController", "sendMessage", &params);
        assert_eq!(inv.key(), "MessageController.sendMessage");
    }

    #[test]
    fn test_hook_error_display() {
        assert_eq!(HookError::failed("boom").to_string(), "hook failed: boom");
        let rejected = HookError::Rejected(OperationError::msg("nope"));
        assert_eq!(rejected.to_string(), "operation rejected: nope");
    }
}
