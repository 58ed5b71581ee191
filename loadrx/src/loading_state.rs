use crate::LoadError;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optional metadata attached to an in-flight load.
///
/// All fields are optional; `Progress::default()` carries nothing.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Progress {
    /// Completion percentage, 0 to 100.
    pub percent: Option<u8>,
    /// Human-readable description of the current step.
    pub message: Option<String>,
    /// Set by a producer that has observed a cancellation request.
    pub cancelled: Option<bool>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(mut self, percent: u8) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = Some(cancelled);
        self
    }
}

/// State of a loading operation.
///
/// Exactly one case is active per instance; the lifecycle runs
/// `Idle` → `Loading` → `Loaded` or `Failed`. A cancelled load terminates
/// its stream without ever reaching a terminal state.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoadingState<V> {
    /// No operation is ongoing.
    Idle,
    /// An operation is in flight, optionally with progress metadata.
    Loading(Option<Progress>),
    /// The operation succeeded.
    Loaded(V),
    /// The operation failed.
    Failed(LoadError),
}

/// Equality disregards the payloads of `Loaded` and `Failed`.
///
/// Loaded values and captured errors are not generally comparable, so two
/// states are equal when the active case matches; for `Loading` the embedded
/// [`Progress`] is compared as well. This is intentional, not a shortcut:
/// `Loaded(1) == Loaded(2)` holds, `Loading(None) != Idle` holds.
impl<V> PartialEq for LoadingState<V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LoadingState::Idle, LoadingState::Idle) => true,
            (LoadingState::Loading(a), LoadingState::Loading(b)) => a == b,
            (LoadingState::Loaded(_), LoadingState::Loaded(_)) => true,
            (LoadingState::Failed(_), LoadingState::Failed(_)) => true,
            _ => false,
        }
    }
}

impl<V> Eq for LoadingState<V> {}

impl<V> LoadingState<V> {
    pub fn loading(progress: Option<Progress>) -> Self {
        LoadingState::Loading(progress)
    }

    pub fn loaded(value: V) -> Self {
        LoadingState::Loaded(value)
    }

    pub fn failed(error: LoadError) -> Self {
        LoadingState::Failed(error)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LoadingState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadingState::Failed(_))
    }

    /// True for `Loaded` and `Failed`, the states that end one attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadingState::Loaded(_) | LoadingState::Failed(_))
    }

    pub fn progress(&self) -> Option<&Progress> {
        match self {
            LoadingState::Loading(Some(progress)) => Some(progress),
            _ => None,
        }
    }

    pub fn value_ref(&self) -> Option<&V> {
        match self {
            LoadingState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error_ref(&self) -> Option<&LoadError> {
        match self {
            LoadingState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<V> Default for LoadingState<V> {
    fn default() -> Self {
        LoadingState::Idle
    }
}

impl<V: fmt::Debug> fmt::Display for LoadingState<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingState::Idle => write!(f, "idle"),
            LoadingState::Loading(None) => write!(f, "loading"),
            LoadingState::Loading(Some(progress)) => {
                write!(f, "loading(")?;
                if let Some(percent) = progress.percent {
                    write!(f, "{percent}%")?;
                }
                if let Some(message) = &progress.message {
                    if progress.percent.is_some() {
                        write!(f, ", ")?;
                    }
                    write!(f, "{message}")?;
                }
                write!(f, ")")
            }
            LoadingState::Loaded(value) => write!(f, "loaded({value:?})"),
            LoadingState::Failed(error) => write!(f, "failed({error})"),
        }
    }
}
