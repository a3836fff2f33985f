//! `replicator-engine`: the two-phase dispatch orchestrator.
//!
//! Composes `replicator-client`, `replicator-aggregator`,
//! `replicator-registry`, `replicator-stateguard`, `replicator-outlier`,
//! `replicator-maintenance`, and `replicator-workerpool` into one
//! `Replicator`, the thing a `Replicate(targets, method, uri, body,
//! headers, verify)` call is actually made against.

mod config;
mod engine;
mod events;
mod headers;
mod hooks;

pub use config::{ReplicatorConfig, ReplicatorConfigBuilder};
pub use engine::Replicator;
pub use events::EngineEvent;
pub use headers::{
    VERIFY_ACCEPT_STATUS, VERIFY_INTENT_VALUE, VERIFY_REJECT_STATUS, X_CLUSTER_CONTEXT,
    X_REQUEST_ID, X_REQUEST_TRANSACTION_ID, X_VERIFY_INTENT,
};
pub use hooks::{AlwaysConnectedDirectory, FlowStateTracker, MergerSelector, NoopFlowStateTracker};

pub use replicator_aggregator::{
    AggregatorHandle, FirstSuccessMerger, MergeError, MergedPayload, Phase, ResponseAggregator,
    ResponseMerger,
};
#[cfg(feature = "json-mergers")]
pub use replicator_aggregator::JsonSumMerger;
pub use replicator_client::{NodeClientBuildError, NodeClientConfig};
pub use replicator_core::{
    Method, NodeId, NodeOutcome, NodeRequest, NodeResponse, NodeTransportError, ReplicatorError,
    RequestId, ERROR_SENTINEL_STATUS,
};
pub use replicator_outlier::{Aggregate, SlowNodeMonitorConfig};
pub use replicator_registry::RegistryConfig;
pub use replicator_stateguard::{ClusterDirectory, ConnectionState};
pub use replicator_workerpool::WorkerPoolConfig;
