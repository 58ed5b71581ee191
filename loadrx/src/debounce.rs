use crate::loadable::lock;
use crate::{Loadable, StateChannel, StateStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Debounce interval used by [`DebouncingLoadable::new`].
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(300);

/// Adds debouncing behavior to a wrapped [`Loadable`].
///
/// A burst of `load()` calls arriving faster than the interval apart
/// collapses into at most one underlying invocation, scheduled once the
/// burst settles. With `execute_first_immediately`, the first call in a
/// quiet period fires right away instead.
///
/// Every state the inner loader emits is forwarded verbatim to this
/// wrapper's own stream, failures included.
pub struct DebouncingLoadable<L: Loadable> {
    shared: Arc<DebounceShared<L>>,
    channel: StateChannel<L::Value>,
    token: CancellationToken,
    relay: JoinHandle<()>,
}

struct DebounceShared<L: Loadable> {
    inner: L,
    interval: Duration,
    execute_first_immediately: bool,
    // true when an interval elapsed without receiving load calls
    quiet_since_last: AtomicBool,
    // the single pending timer; both the debounce timer and the
    // quiet-interval timer live here, last writer wins
    timer: Mutex<Option<JoinHandle<()>>>,
    token: CancellationToken,
}

impl<L: Loadable> DebouncingLoadable<L> {
    /// Wraps `inner` with the default 300 ms interval and deferred first
    /// execution.
    pub fn new(inner: L) -> Self {
        Self::with_options(inner, DEFAULT_DEBOUNCE_INTERVAL, false)
    }

    pub fn with_options(inner: L, interval: Duration, execute_first_immediately: bool) -> Self {
        let channel = StateChannel::new();
        let token = CancellationToken::new();

        // One subscription for the lifetime of the wrapper, taken before
        // any load can run so no inner state is missed.
        let mut inner_states = inner.state();
        let relay = tokio::spawn({
            let channel = channel.clone();
            let token = token.clone();
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        next = inner_states.recv() => match next {
                            Some(state) => channel.send(state),
                            None => break,
                        },
                    }
                }
                channel.close();
            }
        });

        DebouncingLoadable {
            shared: Arc::new(DebounceShared {
                inner,
                interval,
                execute_first_immediately,
                quiet_since_last: AtomicBool::new(true),
                timer: Mutex::new(None),
                token: token.clone(),
            }),
            channel,
            token,
            relay,
        }
    }
}

impl<L: Loadable> Loadable for DebouncingLoadable<L> {
    type Value = L::Value;

    fn state(&self) -> StateStream<L::Value> {
        self.channel.subscribe()
    }

    fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Initiates loading, applying the debouncing rules.
    fn load(&self) {
        if self.token.is_cancelled() {
            return;
        }
        if self.shared.execute_first_immediately
            && self.shared.quiet_since_last.swap(false, Ordering::AcqRel)
        {
            DebounceShared::execute_now(&self.shared);
        } else {
            DebounceShared::schedule_debounced(&self.shared);
        }
    }
}

impl<L: Loadable> DebounceShared<L> {
    /// Invokes the inner loader and arms the quiet-interval timer; when
    /// that timer survives a full interval, the next call counts as the
    /// first in a quiet period again.
    fn execute_now(this: &Arc<Self>) {
        this.inner.load();
        let shared = Arc::clone(this);
        let timer = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shared.token.cancelled() => {}
                _ = sleep(shared.interval) => {
                    shared.quiet_since_last.store(true, Ordering::Release);
                }
            }
        });
        this.install_timer(timer);
    }

    /// Restarts the debounce window. Only the last call in a burst keeps
    /// its timer; when it fires un-cancelled, the load finally executes.
    fn schedule_debounced(this: &Arc<Self>) {
        let shared = Arc::clone(this);
        let timer = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shared.token.cancelled() => {}
                _ = sleep(shared.interval) => {
                    shared.quiet_since_last.store(false, Ordering::Release);
                    Self::execute_now(&shared);
                }
            }
        });
        this.install_timer(timer);
    }

    /// Captures and aborts the previous timer before installing the
    /// replacement, all under the slot lock; a superseded timer can never
    /// fire late.
    fn install_timer(&self, timer: JoinHandle<()>) {
        let mut slot = lock(&self.timer);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(timer);
    }

    fn abort_timer(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }
}

impl<L: Loadable> Drop for DebouncingLoadable<L> {
    fn drop(&mut self) {
        self.token.cancel();
        self.shared.abort_timer();
        self.relay.abort();
        self.channel.close();
    }
}
