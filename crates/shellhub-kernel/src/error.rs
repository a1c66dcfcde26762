//! Error taxonomy shared by every shellhub component.

use serde::{Deserialize, Serialize};

/// Classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed required input.
    Validation,
    /// An identifier or path does not resolve.
    NotFound,
    /// Reserved for duplicate-registration policies.
    Conflict,
    /// Storage I/O failure.
    Io,
    /// Invocation aborted by a cancellation signal.
    Cancelled,
    /// Invocation exceeded its caller-supplied timeout.
    Timeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Io => "io",
            Self::Cancelled => "cancelled",
            Self::Timeout => "timeout",
        }
    }
}

/// Errors raised inside components before they are folded into an `Outcome`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellhubError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Cancelled(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

impl ShellhubError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Io(_) => ErrorKind::Io,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// The bare message without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Io(m)
            | Self::Cancelled(m)
            | Self::Timeout(m) => m,
        }
    }
}

impl From<std::io::Error> for ShellhubError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
