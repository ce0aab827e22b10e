//! CLI runner for common setup.
//!
//! Loads the config file, applies command-line overrides, initializes
//! logging, and owns the Tokio runtime the commands run on.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetcache::config::{AssetCacheConfig, ConfigFile};
use assetcache::logging::{init_logging, LoggingGuard};
use assetcache::service::AssetCache;
use assetcache::store::{DirAssetStore, HttpAssetStore, RemoteAssetStore, StoreError};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Remote store selected by `--source` or `[remote] source`.
pub enum SourceStore {
    Http(HttpAssetStore),
    Dir(DirAssetStore),
}

impl SourceStore {
    /// URLs select HTTP; anything else is a mirror directory.
    fn open(source: &str, config: &ConfigFile) -> Result<Self, CliError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let store = HttpAssetStore::with_timeout(source, config.remote.timeout())?;
            Ok(Self::Http(store))
        } else {
            let root = PathBuf::from(source);
            if !root.is_dir() {
                return Err(CliError::Config(format!(
                    "source '{}' is neither a URL nor a directory",
                    source
                )));
            }
            Ok(Self::Dir(DirAssetStore::new(root)))
        }
    }
}

impl RemoteAssetStore for SourceStore {
    async fn fetch(&self, remote_path: &str, max_bytes: u64) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::Http(store) => store.fetch(remote_path, max_bytes).await,
            Self::Dir(store) => store.fetch(remote_path, max_bytes).await,
        }
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
    cache_config: AssetCacheConfig,
    runtime: Runtime,
}

impl CliRunner {
    /// Loads config and initializes logging.
    ///
    /// `source` and `cache_dir` override the config file.
    pub fn new(
        config_path: Option<&Path>,
        source: Option<String>,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let mut config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        if let Some(source) = source {
            config.remote.source = Some(source);
        }
        if let Some(dir) = cache_dir {
            config.cache.directory = dir;
        }

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(CliError::LoggingInit)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Startup(e.to_string()))?;

        info!(version = assetcache::VERSION, "assetcache CLI starting");

        Ok(Self {
            _logging_guard: logging_guard,
            cache_config: config.to_cache_config(),
            config,
            runtime,
        })
    }

    pub fn cache_config(&self) -> &AssetCacheConfig {
        &self.cache_config
    }

    /// Runs `future` to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Starts an asset cache over the configured remote store.
    pub fn start_cache(&self) -> Result<Arc<AssetCache<SourceStore>>, CliError> {
        let source = self.config.remote.source.as_deref().ok_or(CliError::NoSource)?;
        let store = SourceStore::open(source, &self.config)?;

        let _entered = self.runtime.enter();
        AssetCache::start(self.cache_config.clone(), store)
            .map_err(|e| CliError::Startup(e.to_string()))
    }
}
