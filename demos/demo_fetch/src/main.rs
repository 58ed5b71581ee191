use crate::tracing_setup::tracing_init;
use futures::StreamExt;
use loadrx::{FetchLoader, LoadHandle, LoadStateStreamExt, Loadable, LoadingState, Progress};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

/// Simulated download: ten steps, reporting percent after each one.
async fn fetch_string(handle: LoadHandle<String>) -> Option<String> {
    for step in 1..=10u8 {
        if handle.is_cancelled() {
            return None;
        }
        sleep(Duration::from_millis(100)).await;
        handle.progress(Progress::new().percent(step * 10).message("downloading"));
    }
    Some("loaded data".to_string())
}

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("demo: fetch with progress reporting");

    let loader: FetchLoader<String, _> = FetchLoader::new(fetch_string);
    let mut states = loader.state().until_terminal();
    loader.load();
    while let Some(state) = states.next().await {
        info!("state: {state}");
    }

    info!("==========================================");
    warn!("demo: consumer cancels halfway");

    let loader: FetchLoader<String, _> = FetchLoader::new(fetch_string);
    let mut states = loader.state();
    loader.load();
    while let Some(state) = states.next().await {
        info!("state: {state}");
        if let LoadingState::Loading(Some(progress)) = &state {
            if progress.percent >= Some(50) {
                warn!("cancelling the load");
                loader.cancel();
            }
        }
    }
    info!("stream ended with no terminal state");
}
