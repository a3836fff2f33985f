//! `StateGuard`: consults a host-supplied `ClusterDirectory` and rejects
//! mutating requests fast when any target node is not fully `Connected`.

mod directory;
mod guard;

pub use directory::{ClusterDirectory, ConnectionState};
pub use guard::StateGuard;
