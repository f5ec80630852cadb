// Error types for wrapped calls

use cinch_validation::ValidationError;
use std::fmt;
use thiserror::Error;

/// Errors that can travel through a layer stack.
///
/// `kind` is the tag retry filtering matches against; two errors with the
/// same kind are treated the same way by every layer.
pub trait Fault: fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Stable tag naming the kind of failure, e.g. `"ConnectionError"`.
    fn kind(&self) -> &str;

    /// Whether the error rejected the call's arguments. Validation failures
    /// are never retried.
    fn is_validation(&self) -> bool {
        self.kind() == ValidationError::KIND
    }
}

impl Fault for ValidationError {
    fn kind(&self) -> &str {
        ValidationError::KIND
    }
}

/// General purpose error for targets that don't define their own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind}: {message}")]
    Failure { kind: String, message: String },
}

impl Error {
    /// Create a failure of the given kind.
    pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(e) => &e.message,
            Self::Failure { message, .. } => message,
        }
    }
}

impl Fault for Error {
    fn kind(&self) -> &str {
        match self {
            Self::Validation(_) => ValidationError::KIND,
            Self::Failure { kind, .. } => kind,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
