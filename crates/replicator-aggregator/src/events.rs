//! Observability events emitted by a `ResponseAggregator`.

use replicator_core::{NodeId, ReplicationEvent, RequestId};
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum AggregatorEvent {
    /// Every expected node has reported in, or a fatal error closed the
    /// aggregator early.
    Completed {
        request_id: RequestId,
        timestamp: Instant,
        node_count: usize,
        fatal: bool,
    },
    /// `Consume()` ran the merger (or returned the already-fatal error) for
    /// the first time.
    Consumed {
        request_id: RequestId,
        timestamp: Instant,
        merge_succeeded: bool,
    },
    /// A response arrived for a node outside `expectedNodes`, or after the
    /// node already reported; recorded, never panics.
    DuplicateOrUnexpectedResponse {
        request_id: RequestId,
        node: NodeId,
        timestamp: Instant,
    },
}

impl ReplicationEvent for AggregatorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AggregatorEvent::Completed { .. } => "completed",
            AggregatorEvent::Consumed { .. } => "consumed",
            AggregatorEvent::DuplicateOrUnexpectedResponse { .. } => "duplicate_or_unexpected_response",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            AggregatorEvent::Completed { timestamp, .. }
            | AggregatorEvent::Consumed { timestamp, .. }
            | AggregatorEvent::DuplicateOrUnexpectedResponse { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        "aggregator"
    }
}
