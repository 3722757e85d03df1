//! Error types for Rivulet

use std::fmt;
use thiserror::Error;

/// Result type alias for fallible user callbacks and bridge items
pub type Result<T> = std::result::Result<T, RxError>;

/// Where a stream failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The origin of a stream reported a failure
    Source,
    /// A user-supplied function (map callback, zip combiner) failed
    Operator,
    /// A retry policy gave up
    Policy,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Operator => "operator",
            Self::Policy => "policy",
        };
        f.write_str(name)
    }
}

/// Error value carried by the `error` notification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct RxError {
    kind: ErrorKind,
    message: String,
}

impl RxError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure reported by a stream origin
    pub fn source(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Source, message)
    }

    /// Failure raised by a user-supplied transform
    pub fn operator(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Operator, message)
    }

    /// Retry policy exhaustion
    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Policy, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
