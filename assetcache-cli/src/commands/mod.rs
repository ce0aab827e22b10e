//! CLI command implementations.
//!
//! - [`asset`] - Single model and thumbnail fetches
//! - [`category`] - Category loads and the resource index
//! - [`cache`] - Disk cache management (clear, evict, stats)

pub mod asset;
pub mod cache;
pub mod category;
