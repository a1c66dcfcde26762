//! The uniform result contract returned by every component operation.
//!
//! An `Outcome` is a value, never a fault: success flag, an optional
//! severity-tagged message, and an optional typed payload. Protocol layers
//! translate it (e.g. into HTTP status codes) without inspecting internals.

use crate::error::{ErrorKind, ShellhubError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an outcome message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A human-readable message with severity and optional error classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Information,
            kind: None,
            text: text.into(),
        }
    }

    pub fn error(kind: ErrorKind, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind: Some(kind),
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Information => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{tag}: {}", self.text)
    }
}

impl From<&ShellhubError> for Message {
    fn from(err: &ShellhubError) -> Self {
        match err {
            // Cancellation is a requested stop, not a fault.
            ShellhubError::Cancelled(text) => Self {
                severity: Severity::Information,
                kind: Some(ErrorKind::Cancelled),
                text: text.clone(),
            },
            other => Self::error(other.kind(), other.to_string()),
        }
    }
}

/// `{success, message?, payload?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> Outcome<T> {
    /// Success carrying a payload.
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            message: None,
            payload: Some(payload),
        }
    }

    /// Success without payload.
    pub fn done() -> Self {
        Self {
            success: true,
            message: None,
            payload: None,
        }
    }

    /// Success with an informational note and no payload.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(Message::info(text)),
            payload: None,
        }
    }

    /// Failure described by a component error.
    pub fn failure(err: ShellhubError) -> Self {
        Self {
            success: false,
            message: Some(Message::from(&err)),
            payload: None,
        }
    }

    /// Fold an internal result into an outcome at a component boundary.
    pub fn from_result(result: Result<T, ShellhubError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(err) => Self::failure(err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        if self.success {
            return None;
        }
        self.message.as_ref().and_then(|m| m.kind)
    }

    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            success: self.success,
            message: self.message,
            payload: self.payload.map(f),
        }
    }

    /// Reopen an outcome as an internal result.
    ///
    /// Failures without a classified kind are reported as I/O errors, the
    /// only kind a store can produce without classifying it.
    pub fn into_result(self) -> Result<Option<T>, ShellhubError> {
        if self.success {
            return Ok(self.payload);
        }
        let (kind, text) = match self.message {
            Some(message) => (message.kind.unwrap_or(ErrorKind::Io), message.text),
            None => (ErrorKind::Io, "operation failed".to_string()),
        };
        Err(match kind {
            ErrorKind::Validation => ShellhubError::Validation(text),
            ErrorKind::NotFound => ShellhubError::NotFound(text),
            ErrorKind::Conflict => ShellhubError::Conflict(text),
            ErrorKind::Io => ShellhubError::Io(text),
            ErrorKind::Cancelled => ShellhubError::Cancelled(text),
            ErrorKind::Timeout => ShellhubError::Timeout(text),
        })
    }
}
