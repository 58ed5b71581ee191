use crate::tracing_setup::tracing_init;
use loadrx::{DebouncingLoadable, Loadable, LoadingState, StateChannel, StateStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod tracing_setup;

/// Counts its own invocations and loads the running count.
struct CounterLoader {
    channel: StateChannel<u64>,
    token: CancellationToken,
    count: AtomicU64,
}

impl CounterLoader {
    fn new() -> Self {
        CounterLoader {
            channel: StateChannel::new(),
            token: CancellationToken::new(),
            count: AtomicU64::new(0),
        }
    }
}

impl Loadable for CounterLoader {
    type Value = u64;

    fn state(&self) -> StateStream<u64> {
        self.channel.subscribe()
    }

    fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    fn load(&self) {
        if self.token.is_cancelled() {
            self.channel.close();
            return;
        }
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        self.channel.send(LoadingState::Loading(None));
        self.channel.send(LoadingState::Loaded(count));
    }
}

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("demo: debounced loading, first call immediate");

    let debouncer =
        DebouncingLoadable::with_options(CounterLoader::new(), Duration::from_millis(300), true);
    let mut states = debouncer.state();

    let watcher = tokio::spawn(async move {
        while let Some(state) = states.recv().await {
            info!("state: {state}");
        }
        info!("stream ended");
    });

    warn!("three calls in quick succession");
    debouncer.load();
    debouncer.load();
    debouncer.load();
    // the first call executed immediately; the trailing burst collapses
    // into one more execution after the 300 ms window settles
    sleep(Duration::from_millis(700)).await;

    warn!("one call after a quiet interval");
    debouncer.load();
    sleep(Duration::from_millis(700)).await;

    drop(debouncer);
    let _ = watcher.await;
}
