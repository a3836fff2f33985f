//! Host-supplied collaborators (spec §1's "external, named interfaces"):
//! the `ResponseMerger` selector and the `FlowStateTracker`.
//!
//! `ClusterDirectory` and `ResponseMerger` themselves live in
//! `replicator-stateguard` / `replicator-aggregator`; this module only adds
//! the seams specific to the engine.

use replicator_aggregator::ResponseMerger;
use replicator_core::Method;
use replicator_stateguard::{ClusterDirectory, ConnectionState};
use std::sync::Arc;

/// Chooses the `ResponseMerger` for one cluster request "by content type +
/// path + method", as §4.2 puts it. The engine consults this once per
/// `Replicate` call, before any node is contacted.
pub trait MergerSelector: Send + Sync {
    fn select(&self, method: Method, uri_path: &str, headers: &http::HeaderMap) -> Arc<dyn ResponseMerger>;
}

impl<F> MergerSelector for F
where
    F: Fn(Method, &str, &http::HeaderMap) -> Arc<dyn ResponseMerger> + Send + Sync,
{
    fn select(&self, method: Method, uri_path: &str, headers: &http::HeaderMap) -> Arc<dyn ResponseMerger> {
        self(method, uri_path, headers)
    }
}

/// Notified when a mutation begins (verification round dispatch) and
/// completes (the public aggregator reaches a terminal phase), so the host
/// can track whether its persisted flow state is reliable.
pub trait FlowStateTracker: Send + Sync {
    /// The persisted flow state is now `Unknown`: a verification round is
    /// about to be dispatched and the apply round it may trigger has not
    /// happened yet.
    fn mutation_begins(&self, method: Method, uri_path: &str);

    /// The cluster request reached a terminal phase, successfully or not.
    fn mutation_completes(&self, method: Method, uri_path: &str);
}

/// A `FlowStateTracker` that does nothing; the default for hosts that do
/// not track flow state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFlowStateTracker;

impl FlowStateTracker for NoopFlowStateTracker {
    fn mutation_begins(&self, _method: Method, _uri_path: &str) {}
    fn mutation_completes(&self, _method: Method, _uri_path: &str) {}
}

/// Blanket `ClusterDirectory` impl for a type-erased directory, so
/// `Replicator` can be built without threading a directory type parameter
/// through the whole engine.
pub(crate) type DynClusterDirectory = Arc<dyn ClusterDirectory>;

impl ClusterDirectory for DynClusterDirectory {
    fn connection_state(&self, node: &replicator_core::NodeId) -> ConnectionState {
        (**self).connection_state(node)
    }
}

/// A `ClusterDirectory` that reports every node `Connected`; useful for
/// read-only deployments and tests that never exercise `StateGuard`
/// rejection paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConnectedDirectory;

impl ClusterDirectory for AlwaysConnectedDirectory {
    fn connection_state(&self, _node: &replicator_core::NodeId) -> ConnectionState {
        ConnectionState::Connected
    }
}
