//! `RequestRegistry`: the process-wide `RequestId -> ResponseAggregator`
//! map, with a concurrency cap on insert and a TTL sweep for completed
//! entries nobody polled.

mod config;
mod error;
mod events;
mod registry;

pub use config::{RegistryConfig, RegistryConfigBuilder};
pub use error::RegistryError;
pub use events::RegistryEvent;
pub use registry::RequestRegistry;
