use crate::{LoadError, LoadStateStreamExt, LoadingState, StateChannel};
use futures::StreamExt;

#[tokio::test]
async fn test_until_terminal_stops_after_loaded() {
    let channel: StateChannel<u32> = StateChannel::new();
    let states = channel.subscribe().until_terminal();

    channel.send(LoadingState::Idle);
    channel.send(LoadingState::Loading(None));
    channel.send(LoadingState::Loaded(1));
    channel.send(LoadingState::Loading(None)); // past the terminal state

    let states: Vec<LoadingState<u32>> = states.collect().await;
    assert_eq!(
        states,
        vec![
            LoadingState::Idle,
            LoadingState::Loading(None),
            LoadingState::Loaded(0),
        ]
    );
}

#[tokio::test]
async fn test_until_terminal_stops_after_failed() {
    let channel: StateChannel<u32> = StateChannel::new();
    let states = channel.subscribe().until_terminal();

    channel.send(LoadingState::Loading(None));
    channel.send(LoadingState::Failed(LoadError::Empty));

    let last = states.collect::<Vec<_>>().await.pop();
    assert!(last.is_some_and(|state| state.is_failed()));
}

#[tokio::test]
async fn test_until_terminal_passes_through_stream_end() {
    let channel: StateChannel<u32> = StateChannel::new();
    let states = channel.subscribe().until_terminal();

    channel.send(LoadingState::Loading(None));
    channel.close();

    let states: Vec<LoadingState<u32>> = states.collect().await;
    assert_eq!(states, vec![LoadingState::Loading(None)]);
}
