//! # Liaison Core
//!
//! Core types for the Liaison controller pipeline.
//!
//! This crate provides the foundational types used by every other Liaison crate:
//!
//! - [`FlowId`] - UUID v7 identifier of one pipeline invocation
//! - [`OperationContext`] - Per-invocation identity, timing and middleware scratch data
//! - [`Params`] - JSON-object view of a typed parameter struct
//! - [`OperationResult`] - Outcome envelope produced by the middleware chain
//! - [`OperationError`] - Failures raised by wrapped operations and middleware
//! - [`ErrorClassifier`] / [`ClassifiedError`] - Closed error taxonomy surfaced to callers
//! - [`FlowTracker`] - Active and completed flow bookkeeping

#![doc(html_root_url = "https://docs.rs/liaison-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod classify;
mod context;
mod error;
pub mod flow;
mod params;
mod result;

use std::future::Future;
use std::pin::Pin;

pub use classify::{ClassifiedError, ErrorClassifier, ErrorCode};
pub use context::{FlowId, OperationContext};
pub use error::{FieldViolation, OperationError};
pub use flow::{ControllerFlowStats, FlowRecord, FlowStatus, FlowTracker};
pub use params::Params;
pub use result::OperationResult;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
