//! `ReplicatorConfig`: the flattened tunables of §6, composed into the
//! per-crate configs each subsystem already owns.

use replicator_client::NodeClientConfig;
use replicator_outlier::{Aggregate, SlowNodeMonitorConfig};
use replicator_registry::RegistryConfig;
use replicator_workerpool::WorkerPoolConfig;
use std::time::Duration;

/// Tunables for a `Replicator`, following the teacher's
/// `FooConfig::builder()...build()` convention but composing the five
/// subsystem configs it owns rather than flattening them into one struct.
#[derive(Debug, Clone)]
pub struct ReplicatorConfig {
    pub(crate) node_client: NodeClientConfig,
    pub(crate) registry: RegistryConfig,
    pub(crate) worker_pool: WorkerPoolConfig,
    pub(crate) sweep_interval: Duration,
    pub(crate) entry_ttl: Duration,
    pub(crate) slow_node: SlowNodeMonitorConfig,
}

impl ReplicatorConfig {
    pub fn builder() -> ReplicatorConfigBuilder {
        ReplicatorConfigBuilder::new()
    }
}

pub struct ReplicatorConfigBuilder {
    num_threads: usize,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_concurrent: usize,
    sweep_interval: Duration,
    entry_ttl: Duration,
    slow_factor: f64,
    slow_strikes: u32,
    slow_aggregate: Aggregate,
}

impl ReplicatorConfigBuilder {
    pub fn new() -> Self {
        Self {
            num_threads: 0,
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(3),
            max_concurrent: 100,
            sweep_interval: Duration::from_secs(3),
            entry_ttl: Duration::from_secs(30),
            slow_factor: 1.5,
            slow_strikes: 3,
            slow_aggregate: Aggregate::Median,
        }
    }

    /// Size of the worker pool. Required, must be `> 0`.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Per-hop connect timeout. Default: 3 seconds.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Per-hop read timeout. Default: 3 seconds.
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.read_timeout = duration;
        self
    }

    /// In-flight cluster-request cap. Default: 100.
    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Maintenance sweep period. Default: 3 seconds.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Completed-entry retention before sweep eviction. Default: 30 seconds.
    pub fn entry_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }

    /// Outlier threshold multiplier. Default: 1.5.
    pub fn slow_factor(mut self, factor: f64) -> Self {
        self.slow_factor = factor;
        self
    }

    /// Consecutive slow observations before a warning is emitted. Default: 3.
    pub fn slow_strikes(mut self, strikes: u32) -> Self {
        self.slow_strikes = strikes;
        self
    }

    /// Central tendency the slow-node threshold multiplies. Default: `Median`.
    pub fn slow_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.slow_aggregate = aggregate;
        self
    }

    /// # Panics
    ///
    /// Panics if `num_threads` was never set to a positive value.
    pub fn build(self) -> ReplicatorConfig {
        ReplicatorConfig {
            node_client: NodeClientConfig::builder()
                .connect_timeout(self.connect_timeout)
                .read_timeout(self.read_timeout)
                .build(),
            registry: RegistryConfig::builder().max_concurrent(self.max_concurrent).build(),
            worker_pool: WorkerPoolConfig::builder().num_threads(self.num_threads).build(),
            sweep_interval: self.sweep_interval,
            entry_ttl: self.entry_ttl,
            slow_node: SlowNodeMonitorConfig::builder()
                .slow_factor(self.slow_factor)
                .slow_strikes(self.slow_strikes)
                .aggregate(self.slow_aggregate)
                .build(),
        }
    }
}

impl Default for ReplicatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
