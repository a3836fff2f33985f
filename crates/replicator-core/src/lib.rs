//! Core types, errors, and the event system shared across the cluster
//! request replicator crates: `replicator-client`, `replicator-aggregator`,
//! `replicator-registry`, `replicator-stateguard`, `replicator-outlier`,
//! `replicator-maintenance`, and `replicator-engine`.
//!
//! This crate provides:
//! - `RequestId` / `NodeId` identifiers
//! - `Method`, `NodeRequest`, `NodeResponse`, and the single-consumer
//!   `BodyHandle`
//! - `ReplicatorError<M>`, the unified synchronous/fatal error type
//! - an event system for observability, shared by every component

pub mod body;
pub mod error;
pub mod events;
pub mod ids;
pub mod method;
pub mod node;

pub use body::BodyHandle;
pub use error::ReplicatorError;
pub use events::{EventListener, EventListeners, FnListener, ReplicationEvent};
pub use ids::{NodeId, RequestId};
pub use method::Method;
pub use node::{NodeOutcome, NodeRequest, NodeResponse, NodeTransportError, ERROR_SENTINEL_STATUS};
