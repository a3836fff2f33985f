//! `NodeRequest` / `NodeResponse`: one logical call to one node.

use crate::body::BodyHandle;
use crate::ids::NodeId;
use crate::method::Method;
use bytes::Bytes;
use http::HeaderMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One outbound call to one node, constructed when the replicator dispatches
/// it and destroyed once its `NodeResponse` is produced.
#[derive(Debug, Clone)]
pub struct NodeRequest {
    pub node: NodeId,
    pub method: Method,
    /// The caller's URI rewritten against this node's host/port.
    pub target_uri: http::Uri,
    pub body: Option<Bytes>,
    pub headers: HeaderMap,
    pub deadline: Instant,
}

/// Errors `NodeClient` can encounter talking to one node. Never propagated
/// as an `Err` out of a worker task — always folded into an error
/// `NodeResponse` instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NodeTransportError {
    #[error("connection to {0} failed: {1}")]
    Connect(String, String),
    #[error("tls handshake with {0} failed: {1}")]
    Tls(String, String),
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("malformed uri for {0}: {1}")]
    InvalidUri(String, String),
    #[error("request to {0} failed: {1}")]
    Other(String, String),
}

/// The sentinel status used in an error `NodeResponse` when no real HTTP
/// status was ever received.
pub const ERROR_SENTINEL_STATUS: u16 = 0;

/// What happened when a `NodeRequest` was executed.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    Success {
        status: u16,
        headers: HeaderMap,
        body: Arc<BodyHandle>,
    },
    Error(NodeTransportError),
}

impl NodeOutcome {
    pub fn status(&self) -> u16 {
        match self {
            NodeOutcome::Success { status, .. } => *status,
            NodeOutcome::Error(_) => ERROR_SENTINEL_STATUS,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NodeOutcome::Error(_))
    }
}

/// Result of one `NodeRequest`.
///
/// Invariant: exactly one of `{status+body, error}` is meaningful, expressed
/// here as the `outcome` enum rather than two optional fields.
#[derive(Debug, Clone)]
pub struct NodeResponse {
    pub node: NodeId,
    pub method: Method,
    pub uri: http::Uri,
    pub outcome: NodeOutcome,
    pub started_at: Instant,
    pub duration: Duration,
}

impl NodeResponse {
    pub fn error(
        node: NodeId,
        method: Method,
        uri: http::Uri,
        started_at: Instant,
        error: NodeTransportError,
    ) -> Self {
        Self {
            node,
            method,
            uri,
            outcome: NodeOutcome::Error(error),
            started_at,
            duration: started_at.elapsed(),
        }
    }

    pub fn success(
        node: NodeId,
        method: Method,
        uri: http::Uri,
        started_at: Instant,
        status: u16,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            node,
            method,
            uri,
            outcome: NodeOutcome::Success {
                status,
                headers,
                body: Arc::new(BodyHandle::new(body)),
            },
            started_at,
            duration: started_at.elapsed(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_error()
    }

    pub fn status(&self) -> u16 {
        self.outcome.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> NodeId {
        NodeId::new("a", "127.0.0.1", 9000)
    }

    #[test]
    fn success_response_reports_its_status() {
        let resp = NodeResponse::success(
            node(),
            Method::Get,
            "http://127.0.0.1:9000/x".parse().unwrap(),
            Instant::now(),
            200,
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        );
        assert_eq!(resp.status(), 200);
        assert!(!resp.is_error());
    }

    #[test]
    fn error_response_uses_the_sentinel_status() {
        let resp = NodeResponse::error(
            node(),
            Method::Put,
            "http://127.0.0.1:9000/x".parse().unwrap(),
            Instant::now(),
            NodeTransportError::Timeout("a".into()),
        );
        assert_eq!(resp.status(), ERROR_SENTINEL_STATUS);
        assert!(resp.is_error());
    }
}
