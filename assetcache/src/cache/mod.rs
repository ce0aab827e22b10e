//! Two-tier asset cache.
//!
//! - [`MemoryCache`]: decoded assets, one instance per kind, never persisted
//! - [`DiskCache`]: raw bytes under a size budget, evicted oldest-first
//! - [`MaintenanceDaemon`]: periodic disk eviction and memory trimming

mod daemon;
mod disk;
mod eviction;
mod memory;
mod stats;

pub use daemon::{MaintenanceDaemon, MaintenanceLimits, MaintenanceReport, MaintenanceTask};
pub use disk::DiskCache;
pub use eviction::{DiskEntry, EvictionResult};
pub use memory::MemoryCache;
pub use stats::{CacheCounters, CacheStatistics};

use thiserror::Error;

/// Errors from the disk cache layer.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker panicked or was cancelled
    #[error("Cache worker failed: {0}")]
    Spawn(String),
}
