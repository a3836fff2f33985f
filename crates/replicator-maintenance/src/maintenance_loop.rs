//! `MaintenanceLoop`: a single periodic task driving `RequestRegistry` GC.

use crate::config::MaintenanceConfig;
use replicator_registry::RequestRegistry;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Drives `RequestRegistry::sweep_expired` on a fixed interval, generalized
/// from the teacher's `HealthCheckWrapper::start()`/`stop()` periodic-task
/// wrapper (`wrapper.rs`) from "periodically probe a resource and update its
/// status" to "periodically sweep a map and evict what TTL'd out".
pub struct MaintenanceLoop {
    registry: Arc<RequestRegistry>,
    config: MaintenanceConfig,
    task: RwLock<Option<JoinHandle<()>>>,
}

impl MaintenanceLoop {
    pub fn new(registry: Arc<RequestRegistry>, config: MaintenanceConfig) -> Self {
        Self {
            registry,
            config,
            task: RwLock::new(None),
        }
    }

    /// Spawns the background sweep task. Calling `start()` while already
    /// running replaces the previous task (which is aborted).
    pub async fn start(&self) {
        let registry = Arc::clone(&self.registry);
        let sweep_interval = self.config.sweep_interval;
        let entry_ttl = self.config.entry_ttl;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let evicted = registry.sweep_expired(entry_ttl);

                #[cfg(feature = "tracing")]
                if evicted > 0 {
                    tracing::debug!(evicted, "maintenance sweep evicted expired entries");
                }
                let _ = evicted;
            }
        });

        let mut task = self.task.write().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(handle);
    }

    /// Stops the background sweep task. Idempotent.
    pub async fn stop(&self) {
        let mut task = self.task.write().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.read().await.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for MaintenanceLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.task.try_write().ok().and_then(|mut guard| guard.take()) {
            handle.abort();
        }
    }
}
