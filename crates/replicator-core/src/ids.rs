//! Request and node identifiers.

use std::fmt;

/// Opaque identifier for one cluster request.
///
/// Stable for the life of the request: generated by the replicator when the
/// caller does not supply one via `X-Request-Transaction-Id`, otherwise
/// copied from that header verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh, random request id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps a caller-supplied transaction id verbatim.
    pub fn from_header_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Identity of one data-plane node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub id: String,
    pub api_host: String,
    pub api_port: u16,
}

impl NodeId {
    pub fn new(id: impl Into<String>, api_host: impl Into<String>, api_port: u16) -> Self {
        Self {
            id: id.into(),
            api_host: api_host.into(),
            api_port,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}:{})", self.id, self.api_host, self.api_port)
    }
}
