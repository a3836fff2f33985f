//! `RequestRegistry`: process-wide `RequestId -> ResponseAggregator` map.

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::events::RegistryEvent;
use replicator_aggregator::ResponseAggregator;
use replicator_core::{EventListeners, RequestId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Process-wide map from `RequestId` to `ResponseAggregator`, with an
/// atomic capacity check on insert.
///
/// Guarded by one `Mutex<HashMap<..>>` plus an `AtomicUsize` fast-path
/// count: capacity semantics are structured like the teacher's `Bulkhead`
/// semaphore (a bounded number of live slots, rejection when exhausted),
/// but the registry is keyed by request rather than by in-flight call, so a
/// counting map replaces the `tokio::sync::Semaphore` — entries here are
/// released by the consumer (explicit `consume()` or TTL sweep), not by the
/// task that inserted them, so there is no single owner to hold a permit.
pub struct RequestRegistry {
    entries: Mutex<HashMap<RequestId, ResponseAggregator>>,
    live_count: AtomicUsize,
    config: Arc<RegistryConfig>,
    event_listeners: Arc<EventListeners<RegistryEvent>>,
}

impl RequestRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_event_listeners(config, EventListeners::new())
    }

    pub fn with_event_listeners(
        config: RegistryConfig,
        event_listeners: EventListeners<RegistryEvent>,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            live_count: AtomicUsize::new(0),
            config: Arc::new(config),
            event_listeners: Arc::new(event_listeners),
        }
    }

    /// Number of live entries, read lock-free off the fast-path counter.
    pub fn len(&self) -> usize {
        self.live_count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_concurrent(&self) -> usize {
        self.config.max_concurrent()
    }

    /// Fails with `Overloaded` when live entries are already at
    /// `maxConcurrent`. The capacity check and the insert happen under the
    /// same lock, so concurrent inserts cannot both observe spare capacity
    /// and overshoot it.
    pub fn insert(
        &self,
        request_id: RequestId,
        aggregator: ResponseAggregator,
    ) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().expect("registry mutex poisoned");
        if entries.len() >= self.config.max_concurrent() {
            self.event_listeners.emit(&RegistryEvent::Rejected {
                timestamp: std::time::Instant::now(),
                max_concurrent: self.config.max_concurrent(),
            });

            #[cfg(feature = "metrics")]
            counter!("request_registry_rejections_total", "registry" => self.config.name.clone())
                .increment(1);

            return Err(RegistryError::Overloaded {
                max_concurrent: self.config.max_concurrent(),
            });
        }

        entries.insert(request_id.clone(), aggregator);
        let live = entries.len();
        self.live_count.store(live, Ordering::Release);
        drop(entries);

        self.event_listeners.emit(&RegistryEvent::Inserted {
            request_id,
            timestamp: std::time::Instant::now(),
            live_entries: live,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("request_registry_inserts_total", "registry" => self.config.name.clone())
                .increment(1);
            gauge!("request_registry_live_entries", "registry" => self.config.name.clone())
                .set(live as f64);
        }

        Ok(())
    }

    pub fn lookup(&self, request_id: &RequestId) -> Option<ResponseAggregator> {
        self.entries
            .lock()
            .expect("registry mutex poisoned")
            .get(request_id)
            .cloned()
    }

    pub fn remove(&self, request_id: &RequestId) -> Option<ResponseAggregator> {
        let mut entries = self.entries.lock().expect("registry mutex poisoned");
        let removed = entries.remove(request_id);
        if removed.is_some() {
            let live = entries.len();
            self.live_count.store(live, Ordering::Release);

            #[cfg(feature = "metrics")]
            gauge!("request_registry_live_entries", "registry" => self.config.name.clone())
                .set(live as f64);
        }
        removed
    }

    /// Removes every entry whose aggregator is complete and older than
    /// `age`, running its consumption hook exactly once via `consume()`.
    /// Returns the number of entries evicted.
    pub fn sweep_expired(&self, age: Duration) -> usize {
        let expired: Vec<RequestId> = {
            let entries = self.entries.lock().expect("registry mutex poisoned");
            entries
                .iter()
                .filter(|(_, aggregator)| aggregator.is_complete() && aggregator.is_older_than(age))
                .map(|(id, _)| id.clone())
                .collect()
        };

        let mut evicted = 0;
        for request_id in &expired {
            let aggregator = {
                let mut entries = self.entries.lock().expect("registry mutex poisoned");
                entries.remove(request_id)
            };
            if let Some(aggregator) = aggregator {
                aggregator.mark_expired();
                let _ = aggregator.consume();
                evicted += 1;
            }
        }

        if evicted > 0 {
            let live = self.entries.lock().expect("registry mutex poisoned").len();
            self.live_count.store(live, Ordering::Release);

            self.event_listeners.emit(&RegistryEvent::SweptExpired {
                timestamp: std::time::Instant::now(),
                evicted,
            });

            #[cfg(feature = "metrics")]
            {
                counter!("request_registry_sweep_evictions_total", "registry" => self.config.name.clone())
                    .increment(evicted as u64);
                gauge!("request_registry_live_entries", "registry" => self.config.name.clone())
                    .set(live as f64);
            }
        }

        evicted
    }
}
