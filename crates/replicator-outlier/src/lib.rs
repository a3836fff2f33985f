//! `SlowNodeMonitor`: per-request latency-outlier detection with per-node
//! consecutive-strike hysteresis, so transient single-request slowness is
//! ignored and only sustained slowness is reported, once per burst.

mod config;
mod events;
mod monitor;

pub use config::{Aggregate, SlowNodeMonitorConfig, SlowNodeMonitorConfigBuilder};
pub use events::OutlierEvent;
pub use monitor::SlowNodeMonitor;
