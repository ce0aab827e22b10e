//! assetcache - two-tier cache and concurrent loader for remote avatar assets
//!
//! Fetches model packages and preview thumbnails from a remote store, keeps
//! decoded copies in memory and raw bytes on disk, and serves concurrent
//! requests for the same asset with a single download.
//!
//! # High-Level API
//!
//! The [`service`] module provides the facade:
//!
//! ```ignore
//! use assetcache::config::AssetCacheConfig;
//! use assetcache::service::AssetCache;
//! use assetcache::store::HttpAssetStore;
//!
//! let store = HttpAssetStore::new("https://assets.example.com")?;
//! let cache = AssetCache::start(AssetCacheConfig::default(), store)?;
//!
//! let thumbnail = cache.get_thumbnail("tops_blue_01").await?;
//! ```

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod loader;
pub mod logging;
pub mod service;
pub mod store;

pub use asset::{AssetKey, AssetKind, ModelAsset, Thumbnail};
pub use error::AssetError;
pub use service::AssetCache;

/// Version of the assetcache library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
