//! `NodeClient`: issues one outbound HTTP call to one cluster node and
//! returns a `NodeResponse`, never a propagated `Err`.
//!
//! Connect- and read-timeout budgets are enforced per hop, structured like
//! the teacher's `TimeLimiter` service (a wrapping future around
//! `tokio::time::timeout`) but split into the two independent budgets a
//! cluster hop needs instead of one blanket timeout.
//!
//! ```rust,no_run
//! use replicator_client::{NodeClient, NodeClientConfig};
//! use replicator_core::{Method, NodeId, NodeRequest};
//! use std::time::{Duration, Instant};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NodeClient::new(
//!     NodeClientConfig::builder()
//!         .connect_timeout(Duration::from_secs(3))
//!         .read_timeout(Duration::from_secs(3))
//!         .build(),
//! )?;
//!
//! let request = NodeRequest {
//!     node: NodeId::new("a", "127.0.0.1", 9000),
//!     method: Method::Get,
//!     target_uri: "http://127.0.0.1:9000/status".parse()?,
//!     body: None,
//!     headers: http::HeaderMap::new(),
//!     deadline: Instant::now() + Duration::from_secs(6),
//! };
//!
//! let response = client.do_request(request).await;
//! assert!(!response.is_error() || response.is_error());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod events;

pub use client::{NodeClient, NodeClientBuildError};
pub use config::{NodeClientConfig, NodeClientConfigBuilder};
pub use events::NodeClientEvent;
