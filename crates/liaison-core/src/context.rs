//! Operation context types.
//!
//! The [`OperationContext`] carries the identity of one pipeline invocation
//! through every middleware hook and back to the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// A unique identifier for each flow, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps flow ids sortable in logs and
/// unique for the lifetime of the process.
///
/// # Example
///
/// ```
/// use liaison_core::FlowId;
///
/// let a = FlowId::new();
/// let b = FlowId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Uuid);

impl FlowId {
    /// Creates a new unique flow ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `FlowId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for FlowId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identity and scratch state of one pipeline invocation.
///
/// Everything except the extension map is fixed once the controller has
/// built the context. Middleware attaches its own scratch data (the cache
/// short-circuit marker, the performance start instant) as typed
/// extensions, so business payloads never travel through this type.
///
/// # Example
///
/// ```
/// use liaison_core::{FlowId, OperationContext};
///
/// #[derive(Debug, PartialEq)]
/// struct Marker(u32);
///
/// let mut ctx = OperationContext::new(FlowId::new()).with_user_id("user-1");
/// ctx.set_extension(Marker(7));
///
/// assert_eq!(ctx.user_id(), Some("user-1"));
/// assert_eq!(ctx.get_extension::<Marker>(), Some(&Marker(7)));
/// ```
pub struct OperationContext {
    /// Flow this invocation belongs to.
    flow_id: FlowId,

    /// Wall-clock creation time.
    timestamp: DateTime<Utc>,

    /// Monotonic creation time.
    started_at: Instant,

    /// The user on whose behalf the operation runs.
    user_id: Option<String>,

    /// Client session identifier.
    session_id: Option<String>,

    /// Free-form string metadata.
    metadata: BTreeMap<String, String>,

    /// Type-erased middleware scratch data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl OperationContext {
    /// Creates a context for the given flow.
    #[must_use]
    pub fn new(flow_id: FlowId) -> Self {
        Self {
            flow_id,
            timestamp: Utc::now(),
            started_at: Instant::now(),
            user_id: None,
            session_id: None,
            metadata: BTreeMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the session id.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the flow id.
    #[must_use]
    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    /// Returns the wall-clock creation time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the monotonic creation instant.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the user id, if set.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the session id, if set.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns a metadata value.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Returns all metadata entries.
    #[must_use]
    pub fn metadata_entries(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Stores a typed extension value, replacing any previous value of the same type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("flow_id", &self.flow_id)
            .field("timestamp", &self.timestamp)
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("metadata", &self.metadata)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_ids_are_unique() {
        let ids: std::collections::HashSet<FlowId> = (0..1000).map(|_| FlowId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_flow_id_display_matches_uuid() {
        let uuid = Uuid::now_v7();
        let id = FlowId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn test_builder_fields() {
        let flow_id = FlowId::new();
        let ctx = OperationContext::new(flow_id)
            .with_user_id("u1")
            .with_session_id("s1")
            .with_metadata("source", "chat-screen");

        assert_eq!(ctx.flow_id(), flow_id);
        assert_eq!(ctx.user_id(), Some("u1"));
        assert_eq!(ctx.session_id(), Some("s1"));
        assert_eq!(ctx.metadata("source"), Some("chat-screen"));
        assert!(ctx.metadata("missing").is_none());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Scratch {
            value: i32,
        }

        let mut ctx = OperationContext::new(FlowId::new());
        assert!(!ctx.has_extension::<Scratch>());

        ctx.set_extension(Scratch { value: 42 });
        assert!(ctx.has_extension::<Scratch>());
        assert_eq!(ctx.get_extension::<Scratch>(), Some(&Scratch { value: 42 }));

        ctx.set_extension(Scratch { value: 43 });
        assert_eq!(ctx.remove_extension::<Scratch>(), Some(Scratch { value: 43 }));
        assert!(!ctx.has_extension::<Scratch>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_follows_tokio_clock() {
        let ctx = OperationContext::new(FlowId::new());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(ctx.elapsed(), Duration::from_millis(250));
    }
}
