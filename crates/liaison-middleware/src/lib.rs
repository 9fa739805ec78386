//! # Liaison Middleware
//!
//! Priority-ordered middleware chain wrapping every controller operation.
//!
//! ```text
//! Validation(5) → Logging(10) → Performance(20) → Caching(30) → operation
//!                                                                   │
//!        after / on_error hooks run in the same order ◄─────────────┘
//! ```
//!
//! Unlike a nested `next()` pipeline, stages contribute independent
//! `before`, `after` and `on_error` hooks. Hooks are best-effort: a failing
//! hook is logged and the chain continues. Only a `before` hook returning
//! [`HookError::Rejected`] stops the operation from running.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use liaison_middleware::MiddlewareChain;
//! use liaison_middleware::stages::{CachingMiddleware, LoggingMiddleware, PerformanceMiddleware, ValidationMiddleware};
//!
//! let chain = MiddlewareChain::new();
//! chain.add(Arc::new(CachingMiddleware::default()));
//! chain.add(Arc::new(PerformanceMiddleware::new()));
//! chain.add(Arc::new(LoggingMiddleware::new()));
//! chain.add(Arc::new(ValidationMiddleware::new()));
//!
//! assert_eq!(
//!     chain.middleware_names(),
//!     vec!["ValidationMiddleware", "LoggingMiddleware", "PerformanceMiddleware", "CachingMiddleware"]
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/liaison-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod sanitize;
pub mod stages;

pub use chain::{BoxedMiddleware, MiddlewareChain};
pub use middleware::{FnMiddleware, HookError, Invocation, Middleware};
