//! # Liaison Test
//!
//! Test doubles for the Liaison controller pipeline.
//!
//! Controllers delegate to injected use cases, so most tests only need
//! stubs for those use cases and a way to observe what the pipeline did:
//!
//! - [`ScriptedUseCase`] - Replays queued outcomes and records inputs
//! - [`PermissionFake`] / [`ActivityRecorder`] - Shared collaborator fakes
//! - [`StubServices`] - A complete `Services` bundle over deterministic stubs
//! - [`MemorySink`] - Remote log sink keeping records in memory
//! - [`RecordingMiddleware`] / [`EventLog`] - Observe hook order in a chain
//! - [`TestHarness`] - Standard registry wired to all of the above
//! - [`fixtures`] - Canned domain values
//!
//! ## Example
//!
//! ```
//! use liaison_controller::ChannelController;
//! use liaison_core::ErrorCode;
//! use liaison_test::{fixtures, PermissionFake, StubServices, TestHarness};
//!
//! # tokio_test::block_on(async {
//! let stub = StubServices::with_permissions(PermissionFake::allow_all().deny("channel", "create"));
//! let harness = TestHarness::with_stub(stub);
//! let channels = harness.controller::<ChannelController>("channel").unwrap();
//!
//! let err = channels
//!     .create_channel(fixtures::new_channel("general", "u1"))
//!     .await
//!     .unwrap_err();
//! assert_eq!(err.code, ErrorCode::PermissionDenied);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/liaison-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod fakes;
pub mod fixtures;
mod harness;
mod middleware;
mod services;
mod sink;

pub use fakes::{ActivityRecorder, PermissionFake, ScriptedUseCase};
pub use harness::TestHarness;
pub use middleware::{EventLog, RecordingMiddleware};
pub use services::StubServices;
pub use sink::MemorySink;
