//! The unified error type returned synchronously from `Replicate`, and the
//! fatal errors a `ResponseAggregator` can carry.
//!
//! Modeled on the teacher pattern of one generic error enum per composed
//! subsystem (there: `ResilienceError<E>` wrapping the application error from
//! whichever layer rejected the call; here: `ReplicatorError<M>` wrapping the
//! merger's application error `M`), so host code gets the same
//! `is_timeout()`-style helpers instead of hand-rolled `From` impls per
//! failure source.

use crate::ids::NodeId;
use std::fmt;

/// Unified error type for the replicator.
///
/// `M` is the application error type a `ResponseMerger` can fail with; it
/// only appears in the `Merge` variant, so code that never calls `Consume`
/// can use `ReplicatorError<std::convert::Infallible>` and still compile.
#[derive(Debug, Clone)]
pub enum ReplicatorError<M> {
    /// Empty target set, unknown method, or a malformed URI — rejected
    /// synchronously, before any node is contacted.
    InvalidArgument { message: String },

    /// A mutating request was attempted while a node is `Disconnected` or
    /// `Disconnecting`.
    DisconnectedNodeRejection { node: NodeId },

    /// A mutating request was attempted while a node is `Connecting`.
    ConnectingNodeRejection { node: NodeId },

    /// The request registry is at `maxConcurrent` capacity.
    Overloaded { max_concurrent: usize },

    /// At least one node answered the verification round with a status
    /// other than 150. `primary` is the first dissent's explanation;
    /// `dissenting` lists every node that did not accept, including the
    /// primary.
    VerificationRejected {
        primary: String,
        dissenting: Vec<(NodeId, String)>,
    },

    /// The `ResponseMerger` could not combine the collected responses.
    Merge(M),
}

impl<M> fmt::Display for ReplicatorError<M>
where
    M: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicatorError::InvalidArgument { message } => {
                write!(f, "invalid argument: {message}")
            }
            ReplicatorError::DisconnectedNodeRejection { node } => {
                write!(f, "node {node} is disconnected or disconnecting")
            }
            ReplicatorError::ConnectingNodeRejection { node } => {
                write!(f, "node {node} is still connecting")
            }
            ReplicatorError::Overloaded { max_concurrent } => {
                write!(f, "request registry at capacity ({max_concurrent})")
            }
            ReplicatorError::VerificationRejected { primary, .. } => {
                write!(f, "verification rejected: {primary}")
            }
            ReplicatorError::Merge(e) => write!(f, "merge error: {e}"),
        }
    }
}

impl<M> std::error::Error for ReplicatorError<M> where M: fmt::Debug + fmt::Display {}

impl<M> ReplicatorError<M> {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ReplicatorError::InvalidArgument { .. })
    }

    pub fn is_state_rejection(&self) -> bool {
        matches!(
            self,
            ReplicatorError::DisconnectedNodeRejection { .. }
                | ReplicatorError::ConnectingNodeRejection { .. }
        )
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self, ReplicatorError::Overloaded { .. })
    }

    pub fn is_verification_rejected(&self) -> bool {
        matches!(self, ReplicatorError::VerificationRejected { .. })
    }

    pub fn is_merge_error(&self) -> bool {
        matches!(self, ReplicatorError::Merge(_))
    }

    pub fn merge_error(self) -> Option<M> {
        match self {
            ReplicatorError::Merge(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the merger's application error, leaving every other variant
    /// untouched.
    pub fn map_merge<F, T>(self, f: F) -> ReplicatorError<T>
    where
        F: FnOnce(M) -> T,
    {
        match self {
            ReplicatorError::InvalidArgument { message } => {
                ReplicatorError::InvalidArgument { message }
            }
            ReplicatorError::DisconnectedNodeRejection { node } => {
                ReplicatorError::DisconnectedNodeRejection { node }
            }
            ReplicatorError::ConnectingNodeRejection { node } => {
                ReplicatorError::ConnectingNodeRejection { node }
            }
            ReplicatorError::Overloaded { max_concurrent } => {
                ReplicatorError::Overloaded { max_concurrent }
            }
            ReplicatorError::VerificationRejected { primary, dissenting } => {
                ReplicatorError::VerificationRejected { primary, dissenting }
            }
            ReplicatorError::Merge(e) => ReplicatorError::Merge(f(e)),
        }
    }
}
