//! Observability events emitted by `WorkerPool`.

use replicator_core::ReplicationEvent;
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum WorkerPoolEvent {
    /// A job was accepted onto the FIFO queue.
    Submitted { timestamp: Instant },
    /// A job ran to completion on one of the pool's workers.
    Completed { timestamp: Instant },
    /// A job was rejected because the pool was already stopped.
    RejectedAfterStop { timestamp: Instant },
}

impl ReplicationEvent for WorkerPoolEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WorkerPoolEvent::Submitted { .. } => "submitted",
            WorkerPoolEvent::Completed { .. } => "completed",
            WorkerPoolEvent::RejectedAfterStop { .. } => "rejected_after_stop",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            WorkerPoolEvent::Submitted { timestamp }
            | WorkerPoolEvent::Completed { timestamp }
            | WorkerPoolEvent::RejectedAfterStop { timestamp } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        "worker-pool"
    }
}
