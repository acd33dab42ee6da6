use crate::FetchCache;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Handle to the background TTL sweeper task spawned by
/// [`FetchCache::spawn_sweeper`]. Dropping it leaves the task running;
/// call [`stop`](SweeperHandle::stop) to cancel and join it.
pub struct SweeperHandle {
    shutdown: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to exit and waits for it to finish its current
    /// sweep, if any.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        let _ = self.join.await;
    }
}

pub(crate) fn spawn(cache: Arc<FetchCache>) -> SweeperHandle {
    let shutdown = Arc::new(Notify::new());
    let shutdown_rx = shutdown.clone();
    let interval = cache.sweep_interval();

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cache.sweep_expired();
                }
                _ = shutdown_rx.notified() => break,
            }
        }
    });

    SweeperHandle { shutdown, join }
}
