use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::manager::CacheManager;

/// Periodically refreshes a cache through the same single-flight path as
/// readers. The first tick fires immediately to warm the cache.
pub struct RefreshScheduler;

impl RefreshScheduler {
    pub fn spawn(cache: Arc<CacheManager>, interval: Duration) -> SchedulerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let task = tokio::spawn(async move {
            info!("⏰ Refresh scheduler started, every {:?}", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = signal.notified() => break,
                    _ = ticker.tick() => {
                        if !cache.try_refresh().await {
                            debug!("Refresh already running, skipping tick");
                        }
                    }
                }
            }
            info!("🛑 Refresh scheduler stopped");
        });

        SchedulerHandle { shutdown, task }
    }
}

pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the loop and waits for an in-progress refresh to finish.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}
