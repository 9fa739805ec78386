//! Operation failures.
//!
//! [`OperationError`] is what a wrapped operation (or a rejecting middleware
//! hook) fails with. It keeps just enough shape for the
//! [`ErrorClassifier`](crate::ErrorClassifier) to map it into the closed
//! taxonomy without inspecting use-case internals.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::classify::ClassifiedError;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dot-addressed field path.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldViolation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Failure of a wrapped operation.
///
/// # Example
///
/// ```
/// use liaison_core::OperationError;
///
/// let err = OperationError::status(403, "not a channel member");
/// assert_eq!(err.status_code(), Some(403));
/// ```
#[derive(Error, Debug)]
pub enum OperationError {
    /// Transport-level failure (offline, DNS, connection reset).
    #[error("network error: {message}")]
    Network {
        /// Human-readable error message.
        message: String,
    },

    /// Backend answered with a failure status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP-like status code.
        status: u16,
        /// Human-readable error message.
        message: String,
    },

    /// Failure tagged with a backend or collaborator error code.
    #[error("{message}")]
    Coded {
        /// Machine-readable code, e.g. `FORBIDDEN`.
        code: String,
        /// Human-readable error message.
        message: String,
    },

    /// Parameters were rejected before the operation ran.
    #[error("{message}")]
    Validation {
        /// Combined message listing every failed rule.
        message: String,
        /// Individual rule failures.
        violations: Vec<FieldViolation>,
    },

    /// The operation did not settle in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Parameters could not be represented as a JSON object.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A payload could not be encoded or decoded.
    #[error("payload encoding failed: {0}")]
    Payload(#[from] serde_json::Error),

    /// An error that was already classified upstream.
    #[error(transparent)]
    Classified(Box<ClassifiedError>),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OperationError {
    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a coded error.
    #[must_use]
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coded {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error from its violations.
    #[must_use]
    pub fn validation(message: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: message.into(),
            violations,
        }
    }

    /// Creates an error from a plain message.
    #[must_use]
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }

    /// Returns the status code, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Coded { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Returns the validation violations, if this is a validation error.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Returns the message followed by every source in the chain.
    ///
    /// This is the closest thing to a stack that logs can show.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push(err.to_string());
            source = err.source();
        }
        out
    }
}

impl From<ClassifiedError> for OperationError {
    fn from(err: ClassifiedError) -> Self {
        Self::Classified(Box::new(err))
    }
}
