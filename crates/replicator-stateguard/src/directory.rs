//! The `ClusterDirectory` seam: host-supplied node connection state.

use replicator_core::NodeId;

/// Per-node connection state as the host's cluster directory sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Connecting,
    Disconnecting,
    Disconnected,
}

impl ConnectionState {
    pub fn is_transitional(self) -> bool {
        !matches!(self, ConnectionState::Connected)
    }
}

/// Enumerates node identities and their connection state. Implemented by the
/// host application; `StateGuard` only ever reads through this trait.
pub trait ClusterDirectory: Send + Sync {
    fn connection_state(&self, node: &NodeId) -> ConnectionState;

    /// Nodes `StateGuard` should evaluate for a given target set. Default:
    /// every node in `targets` is checked, which is the common case; a
    /// directory backed by a wider cluster view may override this to report
    /// extra nodes relevant to consistency (not used by the default guard).
    fn states_for(&self, targets: &[NodeId]) -> Vec<(NodeId, ConnectionState)> {
        targets
            .iter()
            .map(|node| (node.clone(), self.connection_state(node)))
            .collect()
    }
}
