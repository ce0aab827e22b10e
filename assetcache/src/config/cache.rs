//! Runtime configuration for the asset cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::*;
use crate::asset::{AssetKind, DEFAULT_REMOTE_ROOT, DEFAULT_THUMBNAIL_SIZE};
use crate::cache::MaintenanceLimits;
use crate::index::DEFAULT_CATEGORIES;

/// Configuration for [`AssetCache`](crate::service::AssetCache).
///
/// # Example
///
/// ```
/// use assetcache::config::AssetCacheConfig;
/// use std::time::Duration;
///
/// let config = AssetCacheConfig::new()
///     .with_cache_dir("/tmp/assets")
///     .with_disk_budget(50 * 1024 * 1024)
///     .with_sync_timeout(Duration::from_millis(500));
///
/// assert_eq!(config.disk_budget(), 50 * 1024 * 1024);
/// assert_eq!(config.batch_concurrency(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCacheConfig {
    cache_dir: PathBuf,
    disk_budget: u64,
    maintenance_interval: Duration,
    model_memory_limit: usize,
    thumbnail_memory_limit: usize,
    thumbnail_size: u32,
    model_max_bytes: u64,
    thumbnail_max_bytes: u64,
    index_max_bytes: u64,
    batch_concurrency: usize,
    sync_timeout: Duration,
    remote_root: String,
    default_categories: Vec<String>,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            disk_budget: DEFAULT_DISK_BUDGET,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
            model_memory_limit: DEFAULT_MODEL_MEMORY_LIMIT,
            thumbnail_memory_limit: DEFAULT_THUMBNAIL_MEMORY_LIMIT,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            model_max_bytes: DEFAULT_MODEL_MAX_BYTES,
            thumbnail_max_bytes: DEFAULT_THUMBNAIL_MAX_BYTES,
            index_max_bytes: DEFAULT_INDEX_MAX_BYTES,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            remote_root: DEFAULT_REMOTE_ROOT.to_string(),
            default_categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AssetCacheConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the disk cache root directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the disk budget in bytes. Default: 100 MiB.
    pub fn with_disk_budget(mut self, bytes: u64) -> Self {
        self.disk_budget = bytes;
        self
    }

    /// Set the interval between maintenance cycles. Default: 24 hours.
    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = interval;
        self
    }

    /// Set how many decoded models survive a maintenance cycle.
    pub fn with_model_memory_limit(mut self, entries: usize) -> Self {
        self.model_memory_limit = entries;
        self
    }

    /// Set how many decoded thumbnails survive a maintenance cycle.
    pub fn with_thumbnail_memory_limit(mut self, entries: usize) -> Self {
        self.thumbnail_memory_limit = entries;
        self
    }

    /// Set the square edge length thumbnails are resized to. Default: 200.
    pub fn with_thumbnail_size(mut self, pixels: u32) -> Self {
        self.thumbnail_size = pixels.max(1);
        self
    }

    /// Set the largest accepted remote payload for `kind`.
    pub fn with_max_bytes(mut self, kind: AssetKind, bytes: u64) -> Self {
        match kind {
            AssetKind::Model => self.model_max_bytes = bytes,
            AssetKind::Thumbnail => self.thumbnail_max_bytes = bytes,
        }
        self
    }

    /// Set the largest accepted index file.
    pub fn with_index_max_bytes(mut self, bytes: u64) -> Self {
        self.index_max_bytes = bytes;
        self
    }

    /// Set the number of concurrent remote fetches per batch. Default: 3.
    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit.max(1);
        self
    }

    /// Set the default bounded wait for synchronous lookups. Default: 3 s.
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Set the remote root prefix. Default: `avatar_assets`.
    pub fn with_remote_root(mut self, root: impl Into<String>) -> Self {
        self.remote_root = root.into();
        self
    }

    /// Set the category files always loaded into the index.
    pub fn with_default_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn disk_budget(&self) -> u64 {
        self.disk_budget
    }

    pub fn maintenance_interval(&self) -> Duration {
        self.maintenance_interval
    }

    pub fn model_memory_limit(&self) -> usize {
        self.model_memory_limit
    }

    pub fn thumbnail_memory_limit(&self) -> usize {
        self.thumbnail_memory_limit
    }

    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    /// Largest accepted remote payload for `kind`.
    pub fn max_bytes(&self, kind: AssetKind) -> u64 {
        match kind {
            AssetKind::Model => self.model_max_bytes,
            AssetKind::Thumbnail => self.thumbnail_max_bytes,
        }
    }

    pub fn index_max_bytes(&self) -> u64 {
        self.index_max_bytes
    }

    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
    }

    pub fn sync_timeout(&self) -> Duration {
        self.sync_timeout
    }

    pub fn remote_root(&self) -> &str {
        &self.remote_root
    }

    pub fn default_categories(&self) -> &[String] {
        &self.default_categories
    }

    /// Limits applied by each maintenance cycle.
    pub fn maintenance_limits(&self) -> MaintenanceLimits {
        MaintenanceLimits {
            disk_max_bytes: self.disk_budget,
            model_max_entries: self.model_memory_limit,
            thumbnail_max_entries: self.thumbnail_memory_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssetCacheConfig::default();
        assert_eq!(config.disk_budget(), 100 * 1024 * 1024);
        assert_eq!(config.maintenance_interval(), Duration::from_secs(86_400));
        assert_eq!(config.model_memory_limit(), 50);
        assert_eq!(config.thumbnail_memory_limit(), 50);
        assert_eq!(config.thumbnail_size(), 200);
        assert_eq!(config.max_bytes(AssetKind::Model), 10 * 1024 * 1024);
        assert_eq!(config.max_bytes(AssetKind::Thumbnail), 1024 * 1024);
        assert_eq!(config.index_max_bytes(), 1024 * 1024);
        assert_eq!(config.batch_concurrency(), 3);
        assert_eq!(config.sync_timeout(), Duration::from_secs(3));
        assert_eq!(config.remote_root(), "avatar_assets");
        assert_eq!(config.default_categories(), ["base", "hair", "clothes"]);
    }

    #[test]
    fn test_builders() {
        let config = AssetCacheConfig::new()
            .with_cache_dir("/tmp/x")
            .with_max_bytes(AssetKind::Thumbnail, 10)
            .with_batch_concurrency(0)
            .with_thumbnail_size(64)
            .with_default_categories(["shoes"]);

        assert_eq!(config.cache_dir(), Path::new("/tmp/x"));
        assert_eq!(config.max_bytes(AssetKind::Thumbnail), 10);
        assert_eq!(config.max_bytes(AssetKind::Model), DEFAULT_MODEL_MAX_BYTES);
        assert_eq!(config.batch_concurrency(), 1);
        assert_eq!(config.thumbnail_size(), 64);
        assert_eq!(config.default_categories(), ["shoes"]);
    }

    #[test]
    fn test_maintenance_limits() {
        let limits = AssetCacheConfig::new()
            .with_disk_budget(1000)
            .with_model_memory_limit(5)
            .maintenance_limits();
        assert_eq!(limits.disk_max_bytes, 1000);
        assert_eq!(limits.model_max_entries, 5);
        assert_eq!(limits.thumbnail_max_entries, 50);
    }
}
