use crate::{FetchResult, LoadError, Loadable, LoadingState, Progress, StateChannel, StateStream};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A ready-made [`Loadable`] over an opaque asynchronous fetch.
///
/// The fetch receives a [`LoadHandle`] to publish progress updates and to
/// poll for cancellation; its output goes through [`FetchResult`], so it
/// may return a bare value, a `Result` with any displayable error, or an
/// `Option`. Each `load()` emits `Loading(None)`, runs the fetch, and ends
/// the attempt with `Loaded` or `Failed`, or with silence if the consumer
/// cancelled in the meantime.
///
/// ```no_run
/// use loadrx::{FetchLoader, LoadHandle, Progress};
///
/// let loader: FetchLoader<String, _> = FetchLoader::new(|handle: LoadHandle<String>| async move {
///     handle.progress(Progress::new().percent(50));
///     fetch_remote().await
/// });
/// # async fn fetch_remote() -> Result<String, std::io::Error> { Ok(String::new()) }
/// ```
pub struct FetchLoader<V, F> {
    fetch: Arc<F>,
    channel: StateChannel<V>,
    token: CancellationToken,
    timeout: Option<Duration>,
}

impl<V, F> FetchLoader<V, F> {
    pub fn new(fetch: F) -> Self {
        FetchLoader {
            fetch: Arc::new(fetch),
            channel: StateChannel::new(),
            token: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Bounds each fetch by `timeout`; an elapsed deadline becomes
    /// `Failed(LoadError::Timeout)`.
    pub fn with_timeout(fetch: F, timeout: Duration) -> Self {
        FetchLoader {
            fetch: Arc::new(fetch),
            channel: StateChannel::new(),
            token: CancellationToken::new(),
            timeout: Some(timeout),
        }
    }
}

impl<V, F, Fut, R> Loadable for FetchLoader<V, F>
where
    V: Clone + Send + 'static,
    F: Fn(LoadHandle<V>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: FetchResult<V> + Send + 'static,
{
    type Value = V;

    fn state(&self) -> StateStream<V> {
        self.channel.subscribe()
    }

    fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    fn load(&self) {
        let fetch = Arc::clone(&self.fetch);
        let channel = self.channel.clone();
        let token = self.token.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            if token.is_cancelled() {
                channel.close();
                return;
            }
            channel.send(LoadingState::Loading(None));
            // Let subscribers observe the transition before the fetch runs.
            tokio::task::yield_now().await;

            let handle = LoadHandle {
                channel: channel.clone(),
                token: token.clone(),
            };
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = run_fetch((*fetch)(handle), timeout) => Some(result),
            };
            match outcome {
                // Cancelled mid-fetch: no terminal state, just stream-end.
                None => channel.close(),
                Some(_) if token.is_cancelled() => channel.close(),
                Some(Ok(value)) => channel.send(LoadingState::Loaded(value)),
                Some(Err(error)) => channel.send(LoadingState::Failed(error)),
            }
        });
    }
}

async fn run_fetch<V, Fut, R>(fetch: Fut, timeout: Option<Duration>) -> Result<V, LoadError>
where
    Fut: Future<Output = R>,
    R: FetchResult<V>,
{
    match timeout {
        Some(deadline) => match tokio::time::timeout(deadline, fetch).await {
            Ok(result) => result.into_outcome(),
            Err(_) => Err(LoadError::Timeout),
        },
        None => fetch.await.into_outcome(),
    }
}

impl<V, F> Drop for FetchLoader<V, F> {
    fn drop(&mut self) {
        self.token.cancel();
        self.channel.close();
    }
}

/// The fetch's window into the loader that is running it.
pub struct LoadHandle<V> {
    channel: StateChannel<V>,
    token: CancellationToken,
}

impl<V: Clone> LoadHandle<V> {
    /// Publishes a mid-flight progress update as `Loading(Some(progress))`.
    ///
    /// No-op once the consumer has cancelled.
    pub fn progress(&self, progress: Progress) {
        if self.token.is_cancelled() {
            return;
        }
        self.channel.send(LoadingState::Loading(Some(progress)));
    }

    /// True once the consumer has requested cancellation; a cooperative
    /// fetch checks this between steps and returns early.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the consumer requests cancellation.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
