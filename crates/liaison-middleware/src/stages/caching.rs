//! Result caching middleware.
//!
//! Successful payloads are kept per `(controller, operation, params)` for a
//! TTL resolved from a [`CachePolicy`]. A later identical invocation within
//! the TTL is answered from the cache: the before hook leaves a
//! [`CachedPayload`] marker on the context and the after hook swaps the
//! operation's payload for the cached one and reports a zero duration.
//!
//! The wrapped operation still runs on a hit; only its output is discarded.
//!
//! Expired entries are never served but stay in memory until
//! [`CachingMiddleware::cleanup_expired`] or an invalidation removes them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use liaison_core::{BoxFuture, OperationContext, OperationResult, Params};
use liaison_telemetry::{metrics::record_cache_lookup, Logger};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::middleware::{HookError, Invocation, Middleware};

/// Stage name.
pub const NAME: &str = "CachingMiddleware";

/// Stage priority.
pub const PRIORITY: i32 = 30;

/// TTL used when no per-operation entry matches.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Short-circuit marker left on the context by a cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPayload(pub Value);

/// Resolves the TTL of an operation's cached results.
///
/// Keys are `"Controller:operation"`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use liaison_middleware::stages::caching::CachePolicy;
///
/// let policy = CachePolicy::default()
///     .with_ttl("UserController", "getUser", Duration::from_secs(2));
///
/// assert_eq!(policy.ttl_for("UserController", "getUser"), Duration::from_secs(2));
/// assert_eq!(policy.ttl_for("UserController", "other"), Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    default_ttl: Duration,
    ttls: HashMap<String, Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl CachePolicy {
    /// Creates a policy with no per-operation entries.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            ttls: HashMap::new(),
        }
    }

    /// Creates a policy from a `"Controller:operation" -> TTL` table.
    #[must_use]
    pub fn from_table(default_ttl: Duration, table: BTreeMap<String, Duration>) -> Self {
        Self {
            default_ttl,
            ttls: table.into_iter().collect(),
        }
    }

    /// Sets the TTL for one operation.
    #[must_use]
    pub fn with_ttl(mut self, controller: &str, operation: &str, ttl: Duration) -> Self {
        self.ttls.insert(format!("{controller}:{operation}"), ttl);
        self
    }

    /// Returns the TTL for an operation.
    #[must_use]
    pub fn ttl_for(&self, controller: &str, operation: &str) -> Duration {
        self.ttls
            .get(&format!("{controller}:{operation}"))
            .copied()
            .unwrap_or(self.default_ttl)
    }

    /// Returns the fallback TTL.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

/// Builds the cache key `controller:operation:hash`.
///
/// The hash is the 32-bit rolling hash `h = h * 31 + unit` over the UTF-16
/// units of the parameters' JSON text, written in signed base 36.
///
/// # Example
///
/// ```
/// use liaison_core::Params;
/// use liaison_middleware::stages::caching::cache_key;
///
/// assert_eq!(cache_key("UserController", "getUser", &Params::new()), "UserController:getUser:31e");
/// ```
#[must_use]
pub fn cache_key(controller: &str, operation: &str, params: &Params) -> String {
    format!("{controller}:{operation}:{}", to_base36(rolling_hash(&params.to_json())))
}

fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

fn to_base36(value: i32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut n = i64::from(value).unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        // n % 36 < 36
        #[allow(clippy::cast_possible_truncation)]
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    if value < 0 {
        digits.push(b'-');
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    created: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) > self.ttl
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Stored entries, live or expired.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing live.
    pub misses: u64,
    /// Hits as a percentage of lookups, 0 when there were none.
    pub hit_rate: f64,
}

/// Caches successful payloads and replays them within their TTL.
pub struct CachingMiddleware {
    policy: CachePolicy,
    state: Mutex<CacheState>,
    logger: Logger,
}

impl fmt::Debug for CachingMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingMiddleware")
            .field("policy", &self.policy)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for CachingMiddleware {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl CachingMiddleware {
    /// Creates a cache with the given TTL policy and a local logger.
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_logger(policy, &Logger::new(NAME))
    }

    /// Creates a cache logging through `logger`'s sink.
    #[must_use]
    pub fn with_logger(policy: CachePolicy, logger: &Logger) -> Self {
        Self {
            policy,
            state: Mutex::new(CacheState::default()),
            logger: logger.for_component(NAME),
        }
    }

    /// Returns the TTL policy.
    #[must_use]
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Removes entries whose key contains `pattern`, or every entry for `None`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let removed = {
            let mut state = self.state.lock();
            let before = state.entries.len();
            match pattern {
                Some(pattern) => state.entries.retain(|key, _| !key.contains(pattern)),
                None => state.entries.clear(),
            }
            before - state.entries.len()
        };

        match pattern {
            Some(pattern) => self.logger.info(
                &format!("Cache invalidated for pattern: {pattern}"),
                json!({ "cleared_entries": removed }),
            ),
            None => self
                .logger
                .info("All cache invalidated", json!({ "cleared_entries": removed })),
        }
        removed
    }

    /// Removes expired entries, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut state = self.state.lock();
            let before = state.entries.len();
            state.entries.retain(|_, entry| !entry.is_expired(now));
            before - state.entries.len()
        };

        if removed > 0 {
            self.logger.info(
                "Expired cache entries cleaned",
                json!({ "cleaned_entries": removed }),
            );
        }
        removed
    }

    /// Returns the cache counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let lookups = state.hits + state.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            state.hits as f64 / lookups as f64 * 100.0
        };
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate,
        }
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let live = state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.payload.clone());
        if live.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        live
    }
}

impl Middleware for CachingMiddleware {
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
        let key = cache_key(invocation.controller, invocation.operation, invocation.params);
        let cached = self.lookup(&key);
        record_cache_lookup(cached.is_some());

        if let Some(payload) = cached {
            self.logger.info(
                &format!("Cache hit for {}", invocation.key()),
                json!({ "flow_id": ctx.flow_id().to_string(), "cache_key": key }),
            );
            ctx.set_extension(CachedPayload(payload));
        }
        Box::pin(async { Ok(()) })
    }

    fn after<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        if let Some(CachedPayload(payload)) = result.context_mut().remove_extension::<CachedPayload>() {
            result.set_payload(payload);
            result.set_duration(Duration::ZERO);
            return Box::pin(async { Ok(()) });
        }

        let payload = match result.payload() {
            Some(payload) if !payload.is_null() => payload.clone(),
            _ => return Box::pin(async { Ok(()) }),
        };

        let key = cache_key(invocation.controller, invocation.operation, invocation.params);
        let ttl = self.policy.ttl_for(invocation.controller, invocation.operation);
        self.state.lock().entries.insert(
            key.clone(),
            CacheEntry {
                payload,
                created: Instant::now(),
                ttl,
            },
        );
        self.logger.info(
            &format!("Cached result for {}", invocation.key()),
            json!({
                "flow_id": result.flow_id().to_string(),
                "cache_key": key,
                "ttl_ms": u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            }),
        );
        Box::pin(async { Ok(()) })
    }

    fn on_error<'a>(
        &'a self,
        invocation: Invocation<'a>,
        result: &'a mut OperationResult,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        result.context_mut().remove_extension::<CachedPayload>();

        let key = cache_key(invocation.controller, invocation.operation, invocation.params);
        let evicted = self.state.lock().entries.remove(&key).is_some();
        if evicted {
            self.logger.info(
                &format!("Invalidated cache for {} due to error", invocation.key()),
                json!({
                    "flow_id": result.flow_id().to_string(),
                    "cache_key": key,
                    "error": result.error().map(ToString::to_string),
                }),
            );
        }
        Box::pin(async { Ok(()) })
    }
}
