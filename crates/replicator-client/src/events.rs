//! Observability events emitted by `NodeClient`.

use replicator_core::{NodeId, ReplicationEvent};
use std::time::{Duration, Instant};

/// Events a `NodeClient` emits while executing one `NodeRequest`.
#[derive(Debug, Clone)]
pub enum NodeClientEvent {
    /// The call to `node` completed with a real HTTP status.
    Completed {
        node: NodeId,
        timestamp: Instant,
        status: u16,
        duration: Duration,
    },
    /// The call to `node` failed before a status was ever received.
    Failed {
        node: NodeId,
        timestamp: Instant,
        reason: String,
        duration: Duration,
    },
    /// Neither the connect nor the read budget was honored in time.
    TimedOut {
        node: NodeId,
        timestamp: Instant,
        budget: Duration,
    },
}

impl ReplicationEvent for NodeClientEvent {
    fn event_type(&self) -> &'static str {
        match self {
            NodeClientEvent::Completed { .. } => "completed",
            NodeClientEvent::Failed { .. } => "failed",
            NodeClientEvent::TimedOut { .. } => "timed_out",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            NodeClientEvent::Completed { timestamp, .. }
            | NodeClientEvent::Failed { timestamp, .. }
            | NodeClientEvent::TimedOut { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        "node-client"
    }
}
