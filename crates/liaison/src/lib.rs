//! # Liaison
//!
//! **Controller pipeline for the Liaison chat client**
//!
//! Every business operation runs through a controller that wraps it with an
//! ordered middleware chain before delegating to an injected use case:
//!
//! - **Validation** rejects bad input before anything else runs
//! - **Logging** records start, completion and failures with redacted params
//! - **Performance** aggregates durations and warns on slow operations
//! - **Caching** replays recent payloads under a per-operation TTL
//!
//! Failures come back as a [`ClassifiedError`](core::ClassifiedError) in a
//! closed taxonomy with a user-facing message.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use liaison::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().with_optional_file("liaison.toml")?.load()?;
//!     let registry = ControllerRegistry::standard(ControllerSettings::from_config(&config), services());
//!
//!     let channels = registry.typed::<ChannelController>("channel")?;
//!     let channel = channels.create_channel(new_channel).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! controller.method(args) → ControllerCore → Validation → Logging → Performance → Caching → use case
//!                                                                                             ↓
//! Result<T, ClassifiedError> ← ErrorClassifier ← FlowTracker ← after / on_error hooks ←──────┘
//! ```

#![doc(html_root_url = "https://docs.rs/liaison/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use liaison_core as core;

// Re-export middleware types
pub use liaison_middleware as middleware;

// Re-export telemetry
pub use liaison_telemetry as telemetry;

// Re-export configuration
pub use liaison_config as config;

// Re-export controllers and the registry
pub use liaison_controller as controller;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use liaison::prelude::*;
///
/// let registry_settings = ControllerSettings::from_config(&LiaisonConfig::default());
/// assert_eq!(registry_settings.flow_history_capacity, 1000);
/// ```
pub mod prelude {
    pub use liaison_core::{
        ClassifiedError, ErrorClassifier, ErrorCode, FieldViolation, FlowId, FlowTracker,
        OperationContext, OperationError, OperationResult, Params,
    };

    // Re-export the middleware seam
    pub use liaison_middleware::stages::{CachePolicy, ValidationRule, ValidationSchema};
    pub use liaison_middleware::{HookError, Invocation, Middleware, MiddlewareChain};

    // Re-export telemetry
    pub use liaison_telemetry::{LogLevel, LogRecord, Logger, RemoteSink};

    // Re-export configuration
    pub use liaison_config::{ConfigLoader, LiaisonConfig};

    // Re-export controllers
    pub use liaison_controller::{
        ChannelController, Controller, ControllerCore, ControllerRegistry, ControllerSettings,
        FileController, FnUseCase, MessageController, NotificationController, RegistryError,
        Services, SharedUseCase, UseCase, UserController,
    };
}
