//! Fetch coordination: request coalescing and concurrency-limited batches.

mod batch;
mod coalesce;
mod limiter;

pub use batch::{BatchLoader, BatchReport, DEFAULT_BATCH_CONCURRENCY};
pub use coalesce::{CoordinatorStats, RequestCoordinator};
pub use limiter::{ConcurrencyLimiter, ConcurrencyPermit};
