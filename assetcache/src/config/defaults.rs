//! Default configuration values.

use std::path::PathBuf;
use std::time::Duration;

/// Disk cache budget: 100 MiB.
pub const DEFAULT_DISK_BUDGET: u64 = 100 * 1024 * 1024;

/// Interval between maintenance cycles: 24 hours.
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Decoded models kept in memory after maintenance.
pub const DEFAULT_MODEL_MEMORY_LIMIT: usize = 50;

/// Decoded thumbnails kept in memory after maintenance.
pub const DEFAULT_THUMBNAIL_MEMORY_LIMIT: usize = 50;

/// Largest model file accepted from the store: 10 MiB.
pub const DEFAULT_MODEL_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Largest thumbnail file accepted from the store: 1 MiB.
pub const DEFAULT_THUMBNAIL_MAX_BYTES: u64 = 1024 * 1024;

/// Largest index JSON file accepted from the store: 1 MiB.
pub const DEFAULT_INDEX_MAX_BYTES: u64 = 1024 * 1024;

/// Concurrent remote fetches per batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = crate::loader::DEFAULT_BATCH_CONCURRENCY;

/// Bounded wait for synchronous thumbnail lookups.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(3);

/// Remote store request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = crate::store::DEFAULT_TIMEOUT;

/// Log file name.
pub const DEFAULT_LOG_FILE: &str = "assetcache.log";

/// Platform cache directory for assets, e.g. `~/.cache/assetcache`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("assetcache")
}

/// Directory holding `config.ini`, e.g. `~/.config/assetcache`.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("assetcache")
}

/// Default log directory, e.g. `~/.local/share/assetcache/logs`.
///
/// Kept outside the cache directory, which `clear` deletes wholesale.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("assetcache")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_end_with_crate_name() {
        assert!(default_cache_dir().ends_with("assetcache"));
        assert!(config_directory().ends_with("assetcache"));
        assert!(default_log_dir().ends_with("assetcache/logs"));
    }

    #[test]
    fn test_request_timeout_matches_http_store() {
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, crate::store::DEFAULT_TIMEOUT);
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs(30));
    }
}
