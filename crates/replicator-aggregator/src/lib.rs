//! `ResponseAggregator`: the per-cluster-request collector that knows when
//! its expected node set has reported in and lazily drives a pluggable
//! `ResponseMerger` on first consumption.
//!
//! Internally an `Arc<Mutex<..>>`, the same sharing model the teacher uses
//! for `Bulkhead`'s semaphore-guarded state and `Circuit`'s single mutex.

mod aggregator;
mod events;
mod merger;

pub use aggregator::{AggregatorHandle, Phase, ResponseAggregator};
pub use events::AggregatorEvent;
pub use merger::{MergeError, MergedPayload, ResponseMerger};

#[cfg(feature = "json-mergers")]
pub use merger::JsonSumMerger;
pub use merger::FirstSuccessMerger;
