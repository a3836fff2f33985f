//! Observability events emitted by `Replicator` itself (the `EventSink`
//! seam named in spec §1 is realized as one more `ReplicationEvent` stream,
//! the same mechanism every other crate in this workspace uses).

use replicator_core::{Method, ReplicationEvent, RequestId};
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A cluster request was accepted and dispatch began.
    Dispatched {
        request_id: RequestId,
        timestamp: Instant,
        method: Method,
        node_count: usize,
        two_phase: bool,
    },
    /// A verification round was rejected by at least one node; no apply
    /// round was dispatched.
    VerificationRejected {
        request_id: RequestId,
        timestamp: Instant,
        dissenting_nodes: usize,
    },
    /// The public aggregator reached a terminal phase.
    Completed {
        request_id: RequestId,
        timestamp: Instant,
        fatal: bool,
    },
    /// `Replicate` was rejected synchronously before any node was contacted.
    RejectedSynchronously {
        timestamp: Instant,
        reason: &'static str,
    },
}

impl ReplicationEvent for EngineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::Dispatched { .. } => "dispatched",
            EngineEvent::VerificationRejected { .. } => "verification_rejected",
            EngineEvent::Completed { .. } => "completed",
            EngineEvent::RejectedSynchronously { .. } => "rejected_synchronously",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            EngineEvent::Dispatched { timestamp, .. }
            | EngineEvent::VerificationRejected { timestamp, .. }
            | EngineEvent::Completed { timestamp, .. }
            | EngineEvent::RejectedSynchronously { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        "replicator-engine"
    }
}
