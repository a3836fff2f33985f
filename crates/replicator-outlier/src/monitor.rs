//! `SlowNodeMonitor`: per-request outlier detection with per-node
//! consecutive-strike hysteresis.

use crate::config::{Aggregate, SlowNodeMonitorConfig};
use crate::events::OutlierEvent;
use replicator_core::{EventListeners, NodeId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::counter;

/// Computes an outlier threshold over one request's per-node durations and
/// tracks consecutive slow observations per node, emitting one warning
/// after `slowStrikes` in a row and resetting.
///
/// `tower-resilience-outlier` shipped with no source in the retrieval pack,
/// so this is built from scratch; the counting/reset discipline follows the
/// teacher's `circuitbreaker` crate's failure-rate bookkeeping
/// (`circuit.rs`, a single mutex guarding a count-based window) rather than
/// literal free-standing atomics, since every mutation here already needs
/// to touch the same `HashMap` entry.
pub struct SlowNodeMonitor {
    config: SlowNodeMonitorConfig,
    strikes: Mutex<HashMap<NodeId, u32>>,
    event_listeners: EventListeners<OutlierEvent>,
}

impl SlowNodeMonitor {
    pub fn new(config: SlowNodeMonitorConfig) -> Self {
        Self::with_event_listeners(config, EventListeners::new())
    }

    pub fn with_event_listeners(
        config: SlowNodeMonitorConfig,
        event_listeners: EventListeners<OutlierEvent>,
    ) -> Self {
        Self {
            config,
            strikes: Mutex::new(HashMap::new()),
            event_listeners,
        }
    }

    /// Evaluates one completed request's per-node durations, bumping or
    /// resetting each node's strike counter, and returns the nodes that
    /// crossed `slowStrikes` this call (their counters have already been
    /// reset by the time this returns).
    pub fn evaluate(&self, durations: &[(NodeId, Duration)]) -> Vec<NodeId> {
        if durations.is_empty() {
            return Vec::new();
        }

        let threshold = self.threshold(durations);
        let mut warned = Vec::new();
        let mut strikes = self.strikes.lock().expect("slow node monitor mutex poisoned");

        for (node, duration) in durations {
            let counter = strikes.entry(node.clone()).or_insert(0);
            if *duration > threshold {
                *counter += 1;
                if *counter >= self.config.slow_strikes {
                    *counter = 0;
                    warned.push(node.clone());
                    self.event_listeners.emit(&OutlierEvent::NodeSlowResponse {
                        node: node.clone(),
                        timestamp: Instant::now(),
                        duration: *duration,
                        threshold,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("slow_node_warnings_total", "node" => node.to_string()).increment(1);
                }
            } else {
                *counter = 0;
            }
        }

        warned
    }

    fn threshold(&self, durations: &[(NodeId, Duration)]) -> Duration {
        let mut nanos: Vec<u128> = durations.iter().map(|(_, d)| d.as_nanos()).collect();
        let central = match self.config.aggregate {
            Aggregate::Mean => nanos.iter().sum::<u128>() / nanos.len() as u128,
            Aggregate::Median => {
                nanos.sort_unstable();
                let mid = nanos.len() / 2;
                if nanos.len() % 2 == 0 {
                    (nanos[mid - 1] + nanos[mid]) / 2
                } else {
                    nanos[mid]
                }
            }
        };
        let scaled = (central as f64 * self.config.slow_factor) as u64;
        Duration::from_nanos(scaled)
    }
}
