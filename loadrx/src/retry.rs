use crate::{Loadable, LoadingState, Progress, StateChannel, StateStream};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Retries a wrapped [`Loadable`]'s failures with exponential backoff.
///
/// One `load()` drives the whole sequence: each attempt emits `Loading`
/// (tagged "retrying" after the first), failures are swallowed and retried
/// after 2, 4, 8… seconds, and the wrapper's stream carries exactly one
/// terminal state: `Loaded` from the first attempt that succeeds, or
/// `Failed` once the attempts are exhausted. The backoff is uncapped, as in
/// the upstream behavior. Cancellation at any point, including mid-backoff,
/// ends the stream with no terminal state.
///
/// Attempts are strictly sequential; two inner loads never run
/// concurrently.
pub struct RetryableLoader<L: Loadable> {
    shared: Arc<RetryShared<L>>,
    channel: StateChannel<L::Value>,
    token: CancellationToken,
}

struct RetryShared<L> {
    inner: L,
    max_attempts: u32,
}

impl<L: Loadable> RetryableLoader<L> {
    /// Wraps `inner`, allowing up to `max_attempts` inner invocations per
    /// `load()`. A bound of zero is treated as one.
    pub fn new(inner: L, max_attempts: u32) -> Self {
        RetryableLoader {
            shared: Arc::new(RetryShared {
                inner,
                max_attempts: max_attempts.max(1),
            }),
            channel: StateChannel::new(),
            token: CancellationToken::new(),
        }
    }
}

impl<L: Loadable> Loadable for RetryableLoader<L> {
    type Value = L::Value;

    fn state(&self) -> StateStream<L::Value> {
        self.channel.subscribe()
    }

    fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drives the retry sequence on a spawned task.
    ///
    /// If the inner stream ends without a terminal state the attempt is
    /// restarted without advancing the attempt counter; only cancellation
    /// breaks that loop.
    fn load(&self) {
        let shared = Arc::clone(&self.shared);
        let channel = self.channel.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            let mut attempt: u32 = 0;
            'attempts: while !token.is_cancelled() {
                let progress = (attempt > 0).then(|| Progress::new().message("retrying"));
                channel.send(LoadingState::Loading(progress));

                // Subscribe before triggering: the inner stream has no
                // replay, so a fast loader must not outrun its observer.
                let mut states = shared.inner.state();
                shared.inner.load();

                loop {
                    let next = tokio::select! {
                        biased;
                        _ = token.cancelled() => break 'attempts,
                        next = states.recv() => next,
                    };
                    match next {
                        Some(LoadingState::Loaded(value)) => {
                            channel.send(LoadingState::Loaded(value));
                            channel.close();
                            return;
                        }
                        Some(LoadingState::Failed(error)) => {
                            if token.is_cancelled() {
                                break 'attempts;
                            }
                            attempt += 1;
                            if attempt >= shared.max_attempts {
                                channel.send(LoadingState::Failed(error));
                                channel.close();
                                return;
                            }
                            let backoff = Duration::from_secs(2u64.saturating_pow(attempt));
                            tokio::select! {
                                biased;
                                _ = token.cancelled() => break 'attempts,
                                _ = sleep(backoff) => {}
                            }
                            continue 'attempts;
                        }
                        // Idle and further Loading states are not terminal.
                        Some(_) => {}
                        // Inner stream ended with neither outcome.
                        None => continue 'attempts,
                    }
                }
            }
            // Cancelled: silence, no terminal state.
            channel.close();
        });
    }
}

impl<L: Loadable> Drop for RetryableLoader<L> {
    fn drop(&mut self) {
        self.token.cancel();
        self.channel.close();
    }
}
