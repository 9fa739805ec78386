//! Error classification.
//!
//! Every failure leaving a controller passes through [`ErrorClassifier`]
//! exactly once and comes out as a [`ClassifiedError`] in a closed taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::OperationError;

/// Closed set of error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport failure or timeout.
    NetworkError,
    /// Caller is not authenticated.
    AuthenticationFailed,
    /// Caller is authenticated but not allowed.
    PermissionDenied,
    /// Input was rejected.
    ValidationError,
    /// Backend failure.
    ServerError,
    /// Anything else.
    UnknownError,
}

impl ErrorCode {
    /// All codes, in classification order.
    pub const ALL: [Self; 6] = [
        Self::NetworkError,
        Self::AuthenticationFailed,
        Self::PermissionDenied,
        Self::ValidationError,
        Self::ServerError,
        Self::UnknownError,
    ];

    /// Returns the stable wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Returns the end-user message for this code.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::NetworkError => "There is a problem with the network connection.",
            Self::AuthenticationFailed => "Authentication failed. Please sign in again.",
            Self::PermissionDenied => "You do not have permission to do that.",
            Self::ValidationError => "Please check the information you entered.",
            Self::ServerError => "A server error occurred. Please try again shortly.",
            Self::UnknownError => "An unknown error occurred.",
        }
    }

    /// Short summary used as the classified message.
    const fn summary(self) -> &'static str {
        match self {
            Self::NetworkError => "Network connection failed",
            Self::AuthenticationFailed => "Authentication failed",
            Self::PermissionDenied => "Permission denied",
            Self::ValidationError => "Validation failed",
            Self::ServerError => "Server error occurred",
            Self::UnknownError => "Unknown error occurred",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure mapped into the closed taxonomy.
///
/// The original [`OperationError`] is kept as the error source for
/// diagnostics; `message` is what the controller reports upward.
#[derive(Error, Debug)]
#[error("[{code}] {context}.{operation}: {message}")]
pub struct ClassifiedError {
    /// Category.
    pub code: ErrorCode,
    /// Originating controller.
    pub context: String,
    /// Operation name.
    pub operation: String,
    /// Classified message.
    pub message: String,
    /// Whether `message` is safe to show to an end user.
    pub user_friendly: bool,
    /// When the error was classified.
    pub timestamp: DateTime<Utc>,
    /// The underlying failure.
    #[source]
    pub source: Box<OperationError>,
}

impl ClassifiedError {
    /// Returns the message an end user should see.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        ErrorClassifier::user_message(self)
    }

    /// Returns the underlying failure.
    #[must_use]
    pub fn original(&self) -> &OperationError {
        &self.source
    }
}

/// Maps arbitrary [`OperationError`]s into [`ClassifiedError`]s.
///
/// Categories are tried in taxonomy order. A category matches when the
/// error carries its structural signal (variant, status, code) or its
/// message contains one of its keywords, matched case-sensitively.
/// Unmatched errors become [`ErrorCode::UnknownError`] with their
/// own message and `user_friendly = false`.
///
/// # Example
///
/// ```
/// use liaison_core::{ErrorClassifier, ErrorCode, OperationError};
///
/// let classifier = ErrorClassifier::new();
/// let err = classifier.classify(OperationError::status(401, "token expired"), "UserController", "getCurrentUser");
/// assert_eq!(err.code, ErrorCode::AuthenticationFailed);
/// assert!(err.user_friendly);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Creates a classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classifies a failure raised by `operation` on `context`.
    ///
    /// An already-classified error is returned unchanged.
    #[must_use]
    pub fn classify(
        &self,
        error: OperationError,
        context: &str,
        operation: &str,
    ) -> ClassifiedError {
        let error = match error {
            OperationError::Classified(classified) => return *classified,
            other => other,
        };

        match Self::code_for(&error) {
            ErrorCode::UnknownError => ClassifiedError {
                code: ErrorCode::UnknownError,
                context: context.to_string(),
                operation: operation.to_string(),
                message: error.to_string(),
                user_friendly: false,
                timestamp: Utc::now(),
                source: Box::new(error),
            },
            code => ClassifiedError {
                code,
                context: context.to_string(),
                operation: operation.to_string(),
                message: code.summary().to_string(),
                user_friendly: true,
                timestamp: Utc::now(),
                source: Box::new(error),
            },
        }
    }

    /// Returns the end-user message for a classified error.
    #[must_use]
    pub fn user_message(error: &ClassifiedError) -> &'static str {
        error.code.user_message()
    }

    fn code_for(error: &OperationError) -> ErrorCode {
        let message = error.to_string();
        ErrorCode::ALL
            .into_iter()
            .find(|code| Self::has_signal(*code, error) || Self::has_keyword(*code, &message))
            .unwrap_or(ErrorCode::UnknownError)
    }

    fn has_signal(code: ErrorCode, error: &OperationError) -> bool {
        let status = error.status_code();
        match code {
            ErrorCode::NetworkError => {
                matches!(
                    error,
                    OperationError::Network { .. } | OperationError::Timeout(_)
                ) || error.code() == Some("NETWORK_ERROR")
            }
            ErrorCode::AuthenticationFailed => {
                status == Some(401) || error.code() == Some("UNAUTHORIZED")
            }
            ErrorCode::PermissionDenied => {
                status == Some(403) || error.code() == Some("FORBIDDEN")
            }
            ErrorCode::ValidationError => {
                matches!(
                    error,
                    OperationError::Validation { .. } | OperationError::InvalidParams(_)
                ) || status == Some(400)
                    || error.code() == Some("VALIDATION_ERROR")
            }
            ErrorCode::ServerError => {
                status.is_some_and(|s| s >= 500) || error.code() == Some("SERVER_ERROR")
            }
            ErrorCode::UnknownError => false,
        }
    }

    fn has_keyword(code: ErrorCode, message: &str) -> bool {
        let words: &[&str] = match code {
            ErrorCode::NetworkError => &["network", "fetch", "connection"],
            ErrorCode::AuthenticationFailed => &["unauthorized", "authentication"],
            ErrorCode::PermissionDenied => &["forbidden", "permission"],
            ErrorCode::ValidationError => &["validation", "invalid"],
            ErrorCode::ServerError => &["server", "internal"],
            ErrorCode::UnknownError => &[],
        };
        words.iter().any(|w| message.contains(w))
    }
}
