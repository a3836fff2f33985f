//! Observability events emitted by `RequestRegistry`.

use replicator_core::{ReplicationEvent, RequestId};
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum RegistryEvent {
    Inserted {
        request_id: RequestId,
        timestamp: Instant,
        live_entries: usize,
    },
    Rejected {
        timestamp: Instant,
        max_concurrent: usize,
    },
    SweptExpired {
        timestamp: Instant,
        evicted: usize,
    },
}

impl ReplicationEvent for RegistryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistryEvent::Inserted { .. } => "inserted",
            RegistryEvent::Rejected { .. } => "rejected",
            RegistryEvent::SweptExpired { .. } => "swept_expired",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RegistryEvent::Inserted { timestamp, .. }
            | RegistryEvent::Rejected { timestamp, .. }
            | RegistryEvent::SweptExpired { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        "request-registry"
    }
}
