//! `StateGuard::check`: fail-fast rejection of mutating calls against a
//! cluster in transition.

use crate::directory::{ClusterDirectory, ConnectionState};
use replicator_core::{Method, NodeId, ReplicatorError};

/// Consults a `ClusterDirectory` and rejects mutating requests when any
/// target node is not `Connected`.
///
/// Structured like the teacher's config-driven rejection in
/// `circuitbreaker`'s `classifier.rs` (a pluggable decision seam the caller
/// consults before dispatch), but stateless per call: there is no sliding
/// window here because the directory itself, not an observed failure rate,
/// is the source of truth.
pub struct StateGuard<D> {
    directory: D,
}

impl<D> StateGuard<D>
where
    D: ClusterDirectory,
{
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Read-only methods always pass. Mutating methods (DELETE/POST/PUT)
    /// fail fast on the first node found `Disconnected`/`Disconnecting`
    /// (reported as `DisconnectedNodeRejection`) or `Connecting` (reported
    /// as `ConnectingNodeRejection`); disconnection takes priority when both
    /// kinds of transition are present in one target set, since it is the
    /// harder failure.
    pub fn check<M>(&self, method: Method, targets: &[NodeId]) -> Result<(), ReplicatorError<M>> {
        if !method.is_mutating() {
            return Ok(());
        }

        let states = self.directory.states_for(targets);

        if let Some((node, _)) = states
            .iter()
            .find(|(_, state)| matches!(state, ConnectionState::Disconnected | ConnectionState::Disconnecting))
        {
            return Err(ReplicatorError::DisconnectedNodeRejection { node: node.clone() });
        }

        if let Some((node, _)) = states.iter().find(|(_, state)| *state == ConnectionState::Connecting) {
            return Err(ReplicatorError::ConnectingNodeRejection { node: node.clone() });
        }

        Ok(())
    }
}
