use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::store::SessionBackend;
use super::SessionError;

const MIN_REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that purges expired rows from the durable store.
///
/// It never touches the in-process cache. A failed sweep is logged and retried
/// on the next tick.
pub struct Reaper {
    backend: Arc<dyn SessionBackend>,
    interval: Duration,
}

impl Reaper {
    pub fn new(backend: Arc<dyn SessionBackend>, interval: Duration) -> Self {
        Self {
            backend,
            interval: interval.max(MIN_REAP_INTERVAL),
        }
    }

    /// Run one sweep. Returns the number of rows removed.
    pub async fn sweep_once(&self) -> Result<u64, SessionError> {
        self.backend.delete_expired().await
    }

    /// Start the background reaping task. The first sweep runs immediately.
    pub fn start(self) -> ReaperHandle {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);

            loop {
                interval.tick().await;

                match self.sweep_once().await {
                    Ok(removed) => {
                        if removed > 0 {
                            debug!(removed, "reaped expired sessions");
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "session reaper error");
                    }
                }
            }
        });

        ReaperHandle { handle }
    }
}

/// Owns the reaper task; dropping it stops the task.
pub struct ReaperHandle {
    handle: JoinHandle<()>,
}

impl ReaperHandle {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::SessionRecord;
    use crate::session::store::MemorySessionBackend;
    use crate::session::test_support::FlakyBackend;
    use chrono::{TimeDelta, Utc};

    fn record(token: &str, offset: TimeDelta) -> SessionRecord {
        SessionRecord {
            token: token.to_string(),
            user_id: 1,
            expire_time: Utc::now() + offset,
        }
    }

    #[tokio::test]
    async fn sweep_removes_rows_past_expiry() {
        let backend = MemorySessionBackend::new();
        backend.insert(&record("stale", -TimeDelta::hours(2))).await.unwrap();
        backend.insert(&record("fresh", TimeDelta::hours(2))).await.unwrap();

        let reaper = Reaper::new(Arc::new(backend.clone()), Duration::from_secs(3600));
        assert_eq!(reaper.sweep_once().await.unwrap(), 1);

        assert!(!backend.contains("stale").await);
        assert!(backend.contains("fresh").await);
    }

    #[tokio::test(start_paused = true)]
    async fn background_task_sweeps_on_every_tick() {
        let backend = MemorySessionBackend::new();
        backend.insert(&record("first", -TimeDelta::hours(1))).await.unwrap();

        let _handle = Reaper::new(Arc::new(backend.clone()), Duration::from_secs(3600)).start();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!backend.contains("first").await);

        backend.insert(&record("second", -TimeDelta::hours(1))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!backend.contains("second").await);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_task() {
        let backend = Arc::new(FlakyBackend::default());
        backend.set_fail_writes(true);

        let handle = Reaper::new(backend.clone(), Duration::from_secs(60)).start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.is_running());

        backend.set_fail_writes(false);
        backend.inner.insert(&record("late", -TimeDelta::hours(1))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(handle.is_running());
        assert!(!backend.inner.contains("late").await);
    }
}
