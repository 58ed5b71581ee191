use crate::tracing_setup::tracing_init;
use loadrx::{FetchLoader, LoadHandle, Loadable, RetryableLoader};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

#[tokio::main]
async fn main() {
    tracing_init();

    info!("==========================================");
    warn!("demo: retry with exponential backoff");
    warn!("the fetch fails twice, then succeeds; waits of 2s and 4s ahead");

    let calls = Arc::new(AtomicU32::new(0));
    let flaky: FetchLoader<String, _> = FetchLoader::new({
        let calls = Arc::clone(&calls);
        move |_handle: LoadHandle<String>| {
            let calls = Arc::clone(&calls);
            async move {
                let call = calls.fetch_add(1, Ordering::AcqRel) + 1;
                sleep(Duration::from_millis(200)).await;
                if call <= 2 {
                    Err(format!("connection refused (call {call})"))
                } else {
                    Ok(format!("loaded on call {call}"))
                }
            }
        }
    });

    let loader = RetryableLoader::new(flaky, 3);
    let mut states = loader.state();
    loader.load();
    while let Some(state) = states.recv().await {
        info!("state: {state}");
    }
    info!("stream ended after the terminal state");
}
