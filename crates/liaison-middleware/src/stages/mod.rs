//! Built-in middleware stages.
//!
//! | Priority | Stage | Hooks |
//! |----------|-------|-------|
//! | 5 | [`validation`] | before (may reject) |
//! | 10 | [`logging`] | before, after, on_error |
//! | 20 | [`performance`] | before, after, on_error |
//! | 30 | [`caching`] | before, after, on_error |

pub mod caching;
pub mod logging;
pub mod performance;
pub mod validation;

pub use caching::{CachePolicy, CacheStats, CachedPayload, CachingMiddleware};
pub use logging::LoggingMiddleware;
pub use performance::{PerformanceMiddleware, PerformanceSample};
pub use validation::{RuleKind, ValidationMiddleware, ValidationRule, ValidationSchema, ValidationStats};
