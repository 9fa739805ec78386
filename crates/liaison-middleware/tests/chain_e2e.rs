//! End-to-end chain integration tests.
//!
//! These tests run the four built-in stages together in their standard
//! order:
//!
//! 1. Validation - Reject bad parameters
//! 2. Logging - Start/completion/failure logs
//! 3. Performance - Timing aggregates
//! 4. Caching - Payload replay within TTL

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use liaison_core::{FlowId, OperationContext, OperationError, OperationResult, Params};
use liaison_middleware::{
    stages::{
        CachePolicy, CachingMiddleware, LoggingMiddleware, PerformanceMiddleware,
        ValidationMiddleware, ValidationRule, ValidationSchema,
    },
    MiddlewareChain,
};
use proptest::prelude::*;
use serde_json::{json, Value};

struct Stages {
    chain: MiddlewareChain,
    validation: Arc<ValidationMiddleware>,
    performance: Arc<PerformanceMiddleware>,
    caching: Arc<CachingMiddleware>,
}

fn standard_chain(policy: CachePolicy) -> Stages {
    let validation = Arc::new(ValidationMiddleware::new());
    let performance = Arc::new(PerformanceMiddleware::new());
    let caching = Arc::new(CachingMiddleware::new(policy));

    let chain = MiddlewareChain::new();
    chain.add(caching.clone());
    chain.add(performance.clone());
    chain.add(Arc::new(LoggingMiddleware::new()));
    chain.add(validation.clone());

    Stages {
        chain,
        validation,
        performance,
        caching,
    }
}

async fn call(
    stages: &Stages,
    operation: &str,
    params: &Params,
    calls: &Arc<AtomicUsize>,
    delay: Duration,
) -> OperationResult {
    let calls = Arc::clone(calls);
    stages
        .chain
        .execute(
            "UserController",
            operation,
            params,
            OperationContext::new(FlowId::new()),
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                Ok(json!({ "call": n }))
            },
        )
        .await
}

#[tokio::test]
async fn test_standard_order() {
    let stages = standard_chain(CachePolicy::default());
    assert_eq!(
        stages.chain.middleware_names(),
        vec![
            "ValidationMiddleware",
            "LoggingMiddleware",
            "PerformanceMiddleware",
            "CachingMiddleware"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cache_ttl_scenario() {
    let stages = standard_chain(
        CachePolicy::default().with_ttl("UserController", "getUser", Duration::from_secs(2)),
    );
    let calls = Arc::new(AtomicUsize::new(0));
    let params = Params::new().with("userId", "u1");
    let delay = Duration::from_millis(50);

    // miss: stores
    let first = call(&stages, "getUser", &params, &calls, delay).await;
    assert_eq!(first.payload(), Some(&json!({ "call": 1 })));
    assert_eq!(first.duration(), delay);

    // hit: the thunk runs, its output is discarded
    let second = call(&stages, "getUser", &params, &calls, delay).await;
    assert_eq!(second.payload(), Some(&json!({ "call": 1 })));
    assert_eq!(second.duration(), Duration::ZERO);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_secs(3)).await;

    // expired: miss, fresh payload
    let third = call(&stages, "getUser", &params, &calls, delay).await;
    assert_eq!(third.payload(), Some(&json!({ "call": 3 })));
    assert_eq!(third.duration(), delay);

    let stats = stages.caching.stats();
    assert_eq!((stats.hits, stats.misses), (1, 2));
}

#[tokio::test(start_paused = true)]
async fn test_performance_sees_pre_replay_duration() {
    let stages = standard_chain(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let params = Params::new();

    call(&stages, "getCurrentUser", &params, &calls, Duration::from_millis(40)).await;
    call(&stages, "getCurrentUser", &params, &calls, Duration::from_millis(40)).await;

    // performance runs before caching rewrites the duration
    let sample = stages
        .performance
        .sample("UserController", "getCurrentUser")
        .unwrap();
    assert_eq!(sample.count, 2);
    assert_eq!(sample.total, Duration::from_millis(80));
}

#[tokio::test]
async fn test_validation_short_circuit_never_invokes_operation() {
    let stages = standard_chain(CachePolicy::default());
    stages.validation.add_schema(
        "UserController",
        ValidationSchema::new().operation(
            "authenticateUser",
            vec![
                ValidationRule::required("email"),
                ValidationRule::email("email"),
                ValidationRule::required("password"),
                ValidationRule::min_length("password", 6),
            ],
        ),
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let params = Params::new().with("email", "not-an-email").with("password", "123");
    let result = call(&stages, "authenticateUser", &params, &calls, Duration::ZERO).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let error = result.error().unwrap();
    assert!(matches!(error, OperationError::Validation { .. }));
    assert_eq!(error.violations().len(), 2);
    assert!(error
        .to_string()
        .starts_with("Validation failed for UserController.authenticateUser: email: "));
    assert_eq!(stages.caching.stats().entries, 0);
}

#[tokio::test]
async fn test_unregistered_operation_passes_validation() {
    let stages = standard_chain(CachePolicy::default());
    stages.validation.add_schema(
        "UserController",
        ValidationSchema::new().operation("updateUser", vec![ValidationRule::required("userId")]),
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let result = call(&stages, "getCurrentUser", &Params::new(), &calls, Duration::ZERO).await;

    assert!(result.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_evicts_cached_entry() {
    let stages = standard_chain(CachePolicy::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let params = Params::new().with("channelId", "c1");

    call(&stages, "getChannel", &params, &calls, Duration::ZERO).await;
    assert_eq!(stages.caching.stats().entries, 1);

    let failed = stages
        .chain
        .execute(
            "UserController",
            "getChannel",
            &params,
            OperationContext::new(FlowId::new()),
            || async { Err::<Value, _>(OperationError::status(500, "boom")) },
        )
        .await;

    assert!(!failed.is_success());
    assert_eq!(stages.caching.stats().entries, 0);
}

proptest! {
    #[test]
    fn prop_chain_order_is_sorted_and_stable(priorities in proptest::collection::vec(-5i32..5, 0..20)) {
        use liaison_middleware::FnMiddleware;

        let chain = MiddlewareChain::new();
        for (index, priority) in priorities.iter().enumerate() {
            chain.add(Arc::new(FnMiddleware::new(format!("{priority}:{index}"), *priority)));
        }

        let mut expected: Vec<(i32, usize)> = priorities.iter().copied().zip(0..).collect();
        expected.sort_by_key(|(priority, _)| *priority);
        let expected: Vec<String> = expected
            .into_iter()
            .map(|(priority, index)| format!("{priority}:{index}"))
            .collect();

        prop_assert_eq!(chain.middleware_names(), expected);
    }
}
