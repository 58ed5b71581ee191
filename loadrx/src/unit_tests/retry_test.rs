use super::{FlakyLoader, NeverFinishingLoader};
use crate::{Loadable, LoadingState, Progress, RetryableLoader};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_recovers_before_exhaustion() {
    let inner = Arc::new(FlakyLoader::new(1));
    let loader = RetryableLoader::new(inner.clone(), 2);

    let states = loader.state();
    loader.load();

    let states: Vec<LoadingState<u32>> = states.collect().await;
    assert_eq!(
        states,
        vec![
            LoadingState::Loading(None),
            LoadingState::Loading(Some(Progress::new().message("retrying"))),
            LoadingState::Loaded(0),
        ]
    );
    assert_eq!(states[2].value_ref(), Some(&2), "the second attempt's value wins");
    assert!(states.iter().all(|state| !state.is_failed()));
    assert_eq!(inner.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_emits_single_failure() {
    let inner = Arc::new(FlakyLoader::always_failing());
    let loader = RetryableLoader::new(inner.clone(), 2);

    let states = loader.state();
    loader.load();

    let states: Vec<LoadingState<u32>> = states.collect().await;
    let loading_count = states.iter().filter(|state| state.is_loading()).count();
    let failed_count = states.iter().filter(|state| state.is_failed()).count();
    assert_eq!(loading_count, 2, "one Loading per attempt");
    assert_eq!(failed_count, 1, "exactly one Failed on exhaustion");
    assert!(states.last().is_some_and(LoadingState::is_failed));
    assert_eq!(inner.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_double_per_attempt() {
    let inner = Arc::new(FlakyLoader::always_failing());
    let loader = RetryableLoader::new(inner.clone(), 3);

    let mut states = loader.state();
    let start = Instant::now();
    loader.load();

    let mut loading_at = Vec::new();
    while let Some(state) = states.recv().await {
        if state.is_loading() {
            loading_at.push(start.elapsed());
        }
    }

    assert_eq!(loading_at.len(), 3);
    let first_gap = loading_at[1] - loading_at[0];
    let second_gap = loading_at[2] - loading_at[1];
    assert!(
        first_gap >= Duration::from_secs(2) && first_gap < Duration::from_secs(3),
        "first retry waits 2^1 seconds, got {first_gap:?}"
    );
    assert!(
        second_gap >= Duration::from_secs(4) && second_gap < Duration::from_secs(5),
        "second retry waits 2^2 seconds, got {second_gap:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_backoff_is_silent() {
    let inner = Arc::new(FlakyLoader::always_failing());
    let loader = RetryableLoader::new(inner.clone(), 5);

    let mut states = loader.state();
    loader.load();

    // first attempt has started; the driver is failing or mid-backoff
    assert_eq!(states.recv().await, Some(LoadingState::Loading(None)));
    loader.cancel();

    while let Some(state) = states.recv().await {
        assert!(
            !state.is_terminal(),
            "a cancelled loader must not emit a terminal state, got {state:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_is_clamped_to_one() {
    let inner = Arc::new(FlakyLoader::always_failing());
    let loader = RetryableLoader::new(inner.clone(), 0);

    let states = loader.state();
    loader.load();

    let states: Vec<LoadingState<u32>> = states.collect().await;
    assert_eq!(
        states,
        vec![
            LoadingState::Loading(None),
            LoadingState::Failed(crate::LoadError::message("mock failure")),
        ],
        "no retry Loading is emitted when the bound clamps to one attempt"
    );
    assert_eq!(inner.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_inner_stream_ending_without_terminal_does_not_advance_attempts() {
    let inner = Arc::new(NeverFinishingLoader::new());
    let loader = RetryableLoader::new(inner, 2);

    let mut states = loader.state();
    loader.load();

    // every restarted attempt reports a plain Loading: the counter never
    // advances, so no "retrying" progress ever appears
    for _ in 0..3 {
        let state = states.recv().await;
        assert_eq!(state, Some(LoadingState::Loading(None)));
        assert!(state.is_some_and(|s| s.progress().is_none()));
    }

    loader.cancel();
    while let Some(state) = states.recv().await {
        assert!(!state.is_terminal());
    }
}
