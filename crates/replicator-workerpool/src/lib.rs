//! `WorkerPool`: the bounded worker pool servicing in-flight cluster
//! requests.
//!
//! A fixed-size pool of `numThreads` workers pulls jobs off a FIFO queue —
//! the `Replicator` submits one job per target node per cluster request and
//! wires its completion to the `ResponseAggregator` `Add`/`SetFatal` calls.
//! `numThreads = 1` still completes a multi-node request, serially.

mod config;
mod events;
mod pool;

pub use config::{WorkerPoolConfig, WorkerPoolConfigBuilder};
pub use events::WorkerPoolEvent;
pub use pool::{WorkerPool, WorkerPoolError};
