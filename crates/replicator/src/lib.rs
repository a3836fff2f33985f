//! Cluster-wide HTTP request replication with an optional two-phase
//! verify/apply commit.
//!
//! `replicator` fans one incoming request out across a set of data-plane
//! nodes, collects their responses into a single merged payload, and
//! optionally runs a verification round first: every node gets one chance
//! to veto the mutation (`417`) before any of them are asked to apply it.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! replicator = "0.1"
//! ```
//!
//! ```rust,no_run
//! use replicator::{
//!     AlwaysConnectedDirectory, FirstSuccessMerger, NodeId, NoopFlowStateTracker, Replicator,
//!     ReplicatorConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReplicatorConfig::builder().num_threads(8).build();
//! let replicator = Replicator::new(
//!     config,
//!     AlwaysConnectedDirectory,
//!     |_method, _path, _headers| Arc::new(FirstSuccessMerger) as Arc<_>,
//!     NoopFlowStateTracker,
//! )?;
//! replicator.start().await;
//!
//! let targets = vec![NodeId::new("a", "10.0.0.1", 9000), NodeId::new("b", "10.0.0.2", 9000)];
//! let handle = replicator.replicate(
//!     targets,
//!     replicator::Method::Get,
//!     "http://cluster/status".parse()?,
//!     None,
//!     http::HeaderMap::new(),
//!     false,
//! )?;
//!
//! let _ = handle.consume();
//! replicator.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Two-phase commit
//!
//! Pass `verify = true` on a mutating call (`POST`/`PUT`/`DELETE`) and the
//! replicator runs a verification round first: every target node receives
//! the request with `X-Verify-Intent: 150-NodeContinue` and must answer
//! `150` to accept or `417` to veto. If every node accepts, the apply round
//! runs immediately against the same nodes; if any node vetoes, the request
//! fails with [`ReplicatorError::VerificationRejected`] and no apply round
//! is dispatched at all. Read-only calls (`GET`/`HEAD`/`OPTIONS`) and calls
//! made with `verify = false` skip straight to a single dispatch round.
//!
//! # Collaborators the host supplies
//!
//! - [`ClusterDirectory`]: reports each node's connection state, so
//!   [`StateGuard`] can fail fast on a mutation targeting a node that is
//!   `Connecting` or `Disconnecting`/`Disconnected`.
//! - [`MergerSelector`]: picks the [`ResponseMerger`] for one request by
//!   method/path/headers.
//! - [`FlowStateTracker`]: notified when a mutation begins and completes,
//!   so the host can track whether its own persisted state is reliable
//!   mid-flight.
//!
//! None of these are required to do anything: [`AlwaysConnectedDirectory`]
//! and [`NoopFlowStateTracker`] are no-op defaults for hosts that do not
//! need them.

pub use replicator_engine::{
    AggregatorHandle, ClusterDirectory, ConnectionState, EngineEvent, FirstSuccessMerger,
    FlowStateTracker, MergeError, MergedPayload, MergerSelector, Method, NodeClientBuildError,
    NodeClientConfig, NodeId, NodeOutcome, NodeRequest, NodeResponse, NodeTransportError,
    NoopFlowStateTracker, Phase, RegistryConfig, Replicator, ReplicatorConfig,
    ReplicatorConfigBuilder, ReplicatorError, RequestId, ResponseAggregator, ResponseMerger,
    SlowNodeMonitorConfig, WorkerPoolConfig, AlwaysConnectedDirectory, ERROR_SENTINEL_STATUS,
    VERIFY_ACCEPT_STATUS, VERIFY_REJECT_STATUS, X_CLUSTER_CONTEXT,
};

#[cfg(feature = "json-mergers")]
pub use replicator_engine::JsonSumMerger;

pub use http::{HeaderMap, HeaderValue, Uri};
pub use bytes::Bytes;
