//! # Liaison Controller
//!
//! Controllers wrap every business operation of the client in the standard
//! middleware pipeline and delegate the work itself to injected use cases.
//!
//! - [`ControllerCore`] - chain, flow tracking, counters and error classification
//! - [`Controller`] - lifecycle and reporting surface of a controller
//! - [`UseCase`] / [`FnUseCase`] - the outbound collaborator seam
//! - [`ControllerRegistry`] - type-name keyed controller construction
//! - [`controllers`] - the user, channel, message, file and notification controllers
//!
//! ## Example
//!
//! ```rust,ignore
//! use liaison_controller::{ChannelController, ControllerRegistry, ControllerSettings};
//! use liaison_controller::model::NewChannel;
//!
//! let registry = ControllerRegistry::standard(ControllerSettings::default(), services);
//! let channels = registry.typed::<ChannelController>("channel")?;
//!
//! let channel = channels
//!     .create_channel(NewChannel {
//!         name: "general".into(),
//!         description: String::new(),
//!         kind: Default::default(),
//!         created_by: "u1".into(),
//!         member_ids: vec![],
//!     })
//!     .await?;
//! ```

#![doc(html_root_url = "https://docs.rs/liaison-controller/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
pub mod controllers;
mod error;
pub mod model;
mod pipeline;
mod registry;
mod services;
mod settings;
mod usecase;

pub use crate::controller::Controller;
pub use crate::controllers::{
    ChannelController, FileController, MessageController, NotificationController, UserController,
};
pub use crate::pipeline::{ControllerCore, ControllerInfo, ControllerMetrics};
pub use crate::error::RegistryError;
pub use crate::registry::{
    ControllerMetadata, ControllerRegistry, ControllerStats, FactoryInfo, CAPABILITIES,
    METADATA_VERSION,
};
pub use crate::services::{
    ChannelServices, FileServices, MessageServices, NotificationServices, Services, UserServices,
};
pub use crate::settings::{ControllerSettings, DEFAULT_OPERATION_TIMEOUT};
pub use crate::usecase::{
    ActivityEntry, FnUseCase, PermissionDecision, PermissionRequest, SharedUseCase, UseCase,
};
