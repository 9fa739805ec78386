//! Typed configuration for the Liaison controller pipeline.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`LIAISON__SECTION__KEY`)
//! - `.env` files via `dotenvy`
//! - Strict validation (fails on unknown fields)
//!
//! # Configuration File Format
//!
//! ```toml
//! [telemetry]
//! service_name = "coach-web"
//! environment = "production"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//! remote_forwarding = true
//! remote_min_level = "warn"
//!
//! [pipeline]
//! flow_history_capacity = 1000
//! operation_timeout_ms = 30000
//!
//! [cache]
//! default_ttl_secs = 300
//!
//! [cache.ttl_secs]
//! "UserController:getCurrentUser" = 600
//! "MessageController:getMessages" = 60
//!
//! [performance]
//! slow_threshold_ms = 1000
//! stats_interval = 10
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{LiaisonConfig, LiaisonConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
