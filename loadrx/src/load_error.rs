use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Failure captured from a loading operation.
///
/// The variant is the error kind and the rendered text its message; the
/// original cause is kept as display data, never as a live error object.
/// There is deliberately no `Cancelled` variant: cancellation terminates the
/// state stream silently instead of surfacing as a failure.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoadError {
    /// The operation failed with an underlying cause.
    #[error("{0}")]
    Message(String),

    /// The operation produced no value.
    #[error("operation returned no value")]
    Empty,

    /// The operation missed its deadline.
    #[error("deadline has elapsed")]
    Timeout,
}

impl LoadError {
    pub fn message(message: impl Into<String>) -> Self {
        LoadError::Message(message.into())
    }

    pub fn is_message(&self) -> bool {
        matches!(self, LoadError::Message(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, LoadError::Empty)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LoadError::Timeout)
    }
}
