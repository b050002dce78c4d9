use std::time::Duration;

use tokio::sync::watch;

use crate::state::SharedState;

/// Run an invocation every `interval` until shutdown is signaled. The first
/// run starts immediately.
pub fn spawn_schedule(
    state: SharedState,
    shutdown: watch::Receiver<bool>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(state, shutdown, interval))
}

async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>, interval: Duration) {
    tracing::info!("Scheduled runs every {}s", interval.as_secs());

    loop {
        if *shutdown.borrow() {
            break;
        }

        match state.invoke().await {
            Ok(summary) => tracing::debug!("Scheduled run: {}", summary.message),
            Err(e) => tracing::error!("Scheduled run failed: {e}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::info!("Schedule stopped");
}
