//! Error type for registry operations.

/// Errors that can occur when inserting into a `RequestRegistry`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// The registry is at `maxConcurrent` capacity.
    #[error("request registry is at capacity: max_concurrent ({max_concurrent}) reached")]
    Overloaded { max_concurrent: usize },
}
