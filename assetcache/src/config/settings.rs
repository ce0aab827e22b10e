//! Settings structs for each `[section]` of `config.ini`.
//!
//! Pure data; parsing lives in [`super::parser`].

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use super::AssetCacheConfig;
use crate::asset::{AssetKind, DEFAULT_REMOTE_ROOT, DEFAULT_THUMBNAIL_SIZE};

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub remote: RemoteSettings,
    pub loader: LoaderSettings,
    pub logging: LoggingSettings,
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    /// Disk budget in bytes
    pub disk_size: u64,
    pub maintenance_interval_secs: u64,
    pub model_memory_entries: usize,
    pub thumbnail_memory_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
            disk_size: DEFAULT_DISK_BUDGET,
            maintenance_interval_secs: DEFAULT_MAINTENANCE_INTERVAL.as_secs(),
            model_memory_entries: DEFAULT_MODEL_MEMORY_LIMIT,
            thumbnail_memory_entries: DEFAULT_THUMBNAIL_MEMORY_LIMIT,
        }
    }
}

/// `[remote]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    /// Base URL (`http://`, `https://`) or local mirror directory
    pub source: Option<String>,
    pub root: String,
    pub timeout_secs: u64,
    pub model_max_size: u64,
    pub thumbnail_max_size: u64,
    pub index_max_size: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            source: None,
            root: DEFAULT_REMOTE_ROOT.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            model_max_size: DEFAULT_MODEL_MAX_BYTES,
            thumbnail_max_size: DEFAULT_THUMBNAIL_MAX_BYTES,
            index_max_size: DEFAULT_INDEX_MAX_BYTES,
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[loader]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    pub batch_concurrency: usize,
    pub sync_timeout_ms: u64,
    pub thumbnail_size: u32,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            sync_timeout_ms: DEFAULT_SYNC_TIMEOUT.as_millis() as u64,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ConfigFile {
    /// Runtime cache configuration described by this file.
    pub fn to_cache_config(&self) -> AssetCacheConfig {
        AssetCacheConfig::new()
            .with_cache_dir(self.cache.directory.clone())
            .with_disk_budget(self.cache.disk_size)
            .with_maintenance_interval(Duration::from_secs(self.cache.maintenance_interval_secs))
            .with_model_memory_limit(self.cache.model_memory_entries)
            .with_thumbnail_memory_limit(self.cache.thumbnail_memory_entries)
            .with_remote_root(self.remote.root.clone())
            .with_max_bytes(AssetKind::Model, self.remote.model_max_size)
            .with_max_bytes(AssetKind::Thumbnail, self.remote.thumbnail_max_size)
            .with_index_max_bytes(self.remote.index_max_size)
            .with_batch_concurrency(self.loader.batch_concurrency)
            .with_sync_timeout(Duration::from_millis(self.loader.sync_timeout_ms))
            .with_thumbnail_size(self.loader.thumbnail_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_matches_default_config() {
        let from_file = ConfigFile::default().to_cache_config();
        assert_eq!(from_file, AssetCacheConfig::default());
    }
}
