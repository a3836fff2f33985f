//! Configuration for `MaintenanceLoop`.

use std::time::Duration;

/// Tunables for the periodic registry sweep.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub(crate) sweep_interval: Duration,
    pub(crate) entry_ttl: Duration,
}

impl MaintenanceConfig {
    pub fn builder() -> MaintenanceConfigBuilder {
        MaintenanceConfigBuilder::new()
    }
}

pub struct MaintenanceConfigBuilder {
    sweep_interval: Duration,
    entry_ttl: Duration,
}

impl MaintenanceConfigBuilder {
    pub fn new() -> Self {
        Self {
            sweep_interval: Duration::from_secs(3),
            entry_ttl: Duration::from_secs(30),
        }
    }

    /// How often the sweep runs. Default: 3 seconds.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Minimum age of a completed entry before it is evicted. Default: 30
    /// seconds.
    pub fn entry_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }

    pub fn build(self) -> MaintenanceConfig {
        MaintenanceConfig {
            sweep_interval: self.sweep_interval,
            entry_ttl: self.entry_ttl,
        }
    }
}

impl Default for MaintenanceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
