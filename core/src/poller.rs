// Periodic dashboard refresh
//
// Runs `refresh_dashboard` on a fixed interval until the handle is stopped or
// dropped. Ticks are not coordinated with other store calls.

use crate::store::MissionStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub struct DashboardPoller {
    store: Arc<MissionStore>,
    interval: Duration,
}

impl DashboardPoller {
    pub fn new(store: Arc<MissionStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Spawn the refresh loop. The first refresh happens immediately.
    pub fn start(self) -> PollerHandle {
        let ticks = Arc::new(AtomicU64::new(0));
        let ticks_clone = Arc::clone(&ticks);
        let store = self.store;
        let period = self.interval;

        info!(target: "dashboard_poller", interval_ms = period.as_millis() as u64, "Starting dashboard poller");
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let ok = store.refresh_dashboard().await;
                let n = ticks_clone.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(target: "dashboard_poller", tick = n, ok, "Dashboard poll");
            }
        });

        PollerHandle {
            task: Some(task),
            ticks,
        }
    }
}

/// Owns the refresh task; dropping it cancels the loop
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl PollerHandle {
    /// Completed refresh attempts
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the loop and wait for the task to wind down
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!(target: "dashboard_poller", "Dashboard poller stopped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
