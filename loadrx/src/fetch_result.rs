use crate::LoadError;

/// Conversion from an opaque fetch's output into a load outcome.
///
/// A fetch may return a bare value, a `Result` with any displayable error,
/// or an `Option`; each maps onto `Loaded`/`Failed` without the fetch
/// knowing about [`crate::LoadingState`].
pub trait FetchResult<V> {
    fn into_outcome(self) -> Result<V, LoadError>;
}

impl<V> FetchResult<V> for V {
    fn into_outcome(self) -> Result<V, LoadError> {
        Ok(self)
    }
}

impl<V, E> FetchResult<V> for Result<V, E>
where
    E: ToString,
{
    fn into_outcome(self) -> Result<V, LoadError> {
        self.map_err(|error| LoadError::Message(error.to_string()))
    }
}

impl<V> FetchResult<V> for Option<V> {
    fn into_outcome(self) -> Result<V, LoadError> {
        self.ok_or(LoadError::Empty)
    }
}
