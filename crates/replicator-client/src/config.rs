//! Configuration for `NodeClient`.

use std::time::Duration;

/// Per-hop timeout budgets and client construction options.
///
/// Modeled on the teacher's `TimeLimiterConfig`/`TimeLimiterConfigBuilder`
/// pair, generalized from one timeout duration to the two independent
/// connect/read budgets the node client needs.
#[derive(Debug, Clone)]
pub struct NodeClientConfig {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) default_content_type: String,
    pub(crate) name: String,
}

impl NodeClientConfig {
    pub fn builder() -> NodeClientConfigBuilder {
        NodeClientConfigBuilder::new()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Upper bound on one `NodeClient::do_request` call: connect + read +
    /// a small fixed overhead for request construction.
    pub fn total_budget(&self) -> Duration {
        self.connect_timeout + self.read_timeout + Duration::from_millis(50)
    }
}

/// Builder for [`NodeClientConfig`].
pub struct NodeClientConfigBuilder {
    connect_timeout: Duration,
    read_timeout: Duration,
    default_content_type: String,
    name: String,
}

impl NodeClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(3),
            default_content_type: "application/x-www-form-urlencoded".to_string(),
            name: "node-client".to_string(),
        }
    }

    /// Default: 3 seconds, matching the spec's tunable default.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Default: 3 seconds, matching the spec's tunable default.
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.read_timeout = duration;
        self
    }

    /// Content-Type applied to body-bearing requests that did not supply
    /// one. Default: `application/x-www-form-urlencoded`.
    pub fn default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// Name of this client instance for observability. Default: "node-client".
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> NodeClientConfig {
        NodeClientConfig {
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            default_content_type: self.default_content_type,
            name: self.name,
        }
    }
}

impl Default for NodeClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
