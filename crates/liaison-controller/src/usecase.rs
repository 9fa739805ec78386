//! Outbound collaborator seam.
//!
//! Controllers never implement business rules. Every operation delegates to a
//! [`UseCase`], and permission checks and activity logging are use cases too.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use liaison_core::{BoxFuture, OperationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An asynchronous business operation.
pub trait UseCase<I, O>: Send + Sync {
    /// Runs the operation.
    fn execute(&self, input: I) -> BoxFuture<'_, Result<O, OperationError>>;
}

/// A shared, type-erased use case.
pub type SharedUseCase<I, O> = Arc<dyn UseCase<I, O>>;

/// Adapts an async closure into a [`UseCase`].
///
/// # Example
///
/// ```
/// use liaison_controller::{FnUseCase, UseCase};
///
/// # tokio_test_block_on(async {
/// let double = FnUseCase::new(|n: u32| async move { Ok(n * 2) });
/// assert_eq!(double.execute(21).await.unwrap(), 42);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct FnUseCase<F, I, O> {
    f: F,
    _marker: PhantomData<fn(I) -> O>,
}

impl<F, I, O> fmt::Debug for FnUseCase<F, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnUseCase").finish_non_exhaustive()
    }
}

impl<F, Fut, I, O> FnUseCase<F, I, O>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, OperationError>> + Send + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, Fut, I, O> FnUseCase<F, I, O>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, OperationError>> + Send + 'static,
    I: 'static,
    O: 'static,
{
    /// Wraps `f` and erases its type.
    pub fn shared(f: F) -> SharedUseCase<I, O> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut, I, O> UseCase<I, O> for FnUseCase<F, I, O>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, OperationError>> + Send + 'static,
{
    fn execute(&self, input: I) -> BoxFuture<'_, Result<O, OperationError>> {
        Box::pin((self.f)(input))
    }
}

/// Question put to the permission use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    /// Acting user.
    pub user_id: String,
    /// Resource kind, e.g. `channel`.
    pub resource: String,
    /// Action on the resource, e.g. `create`.
    pub action: String,
    /// Specific resource instance, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl PermissionRequest {
    /// Creates a request without a resource instance.
    pub fn new(user_id: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            resource: resource.into(),
            action: action.into(),
            resource_id: None,
        }
    }

    /// Names the resource instance.
    #[must_use]
    pub fn on(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

/// Answer of the permission use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// Why it may not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionDecision {
    /// Grants the request.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// Denies the request.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// An entry for the activity log use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Acting user.
    pub user_id: String,
    /// Activity code, e.g. `CHANNEL_CREATE`.
    pub action: String,
    /// Resource kind.
    pub resource: String,
    /// Resource instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Free-form details.
    #[serde(default)]
    pub details: Value,
    /// When the activity happened.
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    /// Creates an entry stamped now.
    pub fn new(user_id: impl Into<String>, action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            action: action.into(),
            resource: resource.into(),
            resource_id: None,
            details: Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Names the resource instance.
    #[must_use]
    pub fn on(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Attaches details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
