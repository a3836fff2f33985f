//! Observability events emitted by `SlowNodeMonitor`.

use replicator_core::{NodeId, ReplicationEvent};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum OutlierEvent {
    /// `node` has been an outlier for `slowStrikes` consecutive requests;
    /// the counter has just been reset.
    NodeSlowResponse {
        node: NodeId,
        timestamp: Instant,
        duration: Duration,
        threshold: Duration,
    },
}

impl ReplicationEvent for OutlierEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OutlierEvent::NodeSlowResponse { .. } => "node_slow_response",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            OutlierEvent::NodeSlowResponse { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        "slow-node-monitor"
    }
}
