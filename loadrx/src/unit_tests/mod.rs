use crate::{LoadError, Loadable, LoadingState, StateChannel, StateStream};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

mod retry_test;
mod stream_ext_test;

/// Counts `load()` calls and immediately succeeds with the running count.
pub struct CountingLoader {
    channel: StateChannel<u32>,
    token: CancellationToken,
    calls: AtomicU32,
}

impl CountingLoader {
    pub fn new() -> Self {
        CountingLoader {
            channel: StateChannel::new(),
            token: CancellationToken::new(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Acquire)
    }
}

impl Loadable for CountingLoader {
    type Value = u32;

    fn state(&self) -> StateStream<u32> {
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
        let count = self.calls.fetch_add(1, Ordering::AcqRel) + 1;
        self.channel.send(LoadingState::Loading(None));
        self.channel.send(LoadingState::Loaded(count));
    }
}

/// Fails the first `fail_times` calls, then succeeds with the call count.
pub struct FlakyLoader {
    channel: StateChannel<u32>,
    token: CancellationToken,
    calls: AtomicU32,
    fail_times: u32,
}

impl FlakyLoader {
    pub fn new(fail_times: u32) -> Self {
        FlakyLoader {
            channel: StateChannel::new(),
            token: CancellationToken::new(),
            calls: AtomicU32::new(0),
            fail_times,
        }
    }

    pub fn always_failing() -> Self {
        Self::new(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Acquire)
    }
}

impl Loadable for FlakyLoader {
    type Value = u32;

    fn state(&self) -> StateStream<u32> {
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
        let count = self.calls.fetch_add(1, Ordering::AcqRel) + 1;
        self.channel.send(LoadingState::Loading(None));
        if count <= self.fail_times {
            self.channel
                .send(LoadingState::Failed(LoadError::message("mock failure")));
        } else {
            self.channel.send(LoadingState::Loaded(count));
        }
    }
}

/// Emits `Loading` and then closes its stream without a terminal state.
pub struct NeverFinishingLoader {
    channel: StateChannel<u32>,
    token: CancellationToken,
}

impl NeverFinishingLoader {
    pub fn new() -> Self {
        NeverFinishingLoader {
            channel: StateChannel::new(),
            token: CancellationToken::new(),
        }
    }
}

impl Loadable for NeverFinishingLoader {
    type Value = u32;

    fn state(&self) -> StateStream<u32> {
        self.channel.subscribe()
    }

    fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    fn load(&self) {
        self.channel.send(LoadingState::Loading(None));
        self.channel.close();
    }
}
