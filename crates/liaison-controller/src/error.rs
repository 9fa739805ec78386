//! Registry errors.

use thiserror::Error;

/// Errors raised by the [`ControllerRegistry`](crate::ControllerRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No factory is registered under the type name.
    #[error("Unknown controller type: {0}")]
    UnknownType(String),

    /// The controller registered under the type name is of another type.
    #[error("controller '{type_name}' is not a {expected}")]
    TypeMismatch {
        /// Requested type name.
        type_name: String,
        /// Requested Rust type.
        expected: &'static str,
    },
}
