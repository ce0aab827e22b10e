//! Asset cache facade.

use std::collections::HashSet;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::fetch::{CachedAsset, DecodeOptions, Fetcher};
use crate::asset::{AssetKey, AssetKind, ModelAsset, Thumbnail};
use crate::cache::{
    CacheCounters, CacheError, CacheStatistics, DiskCache, MaintenanceDaemon, MaintenanceReport,
    MaintenanceTask, MemoryCache,
};
use crate::config::AssetCacheConfig;
use crate::error::AssetError;
use crate::index::{Color, ResourceIndex};
use crate::loader::{BatchLoader, BatchReport, ConcurrencyLimiter, RequestCoordinator};
use crate::store::RemoteAssetStore;

/// Fetches, caches, and serves remote assets.
///
/// Owns the memory caches, the disk cache, request coalescing, and the
/// maintenance daemon. Create one with [`AssetCache::start`] and share the
/// returned `Arc`.
///
/// # Example
///
/// ```ignore
/// use assetcache::config::AssetCacheConfig;
/// use assetcache::service::AssetCache;
/// use assetcache::store::HttpAssetStore;
///
/// let store = HttpAssetStore::new("https://assets.example.com")?;
/// let cache = AssetCache::start(AssetCacheConfig::default(), store)?;
///
/// let model = cache.get_model("tops_blue_01").await?;
/// let report = cache.load_category("clothes").await?;
/// cache.shutdown();
/// ```
pub struct AssetCache<S: RemoteAssetStore> {
    config: AssetCacheConfig,
    store: Arc<S>,
    fetcher: Fetcher<S>,
    disk: Arc<DiskCache>,
    models: Arc<MemoryCache<ModelAsset>>,
    thumbnails: Arc<MemoryCache<Thumbnail>>,
    model_requests: RequestCoordinator<ModelAsset>,
    thumbnail_requests: RequestCoordinator<Thumbnail>,
    batch: BatchLoader,
    counters: Arc<CacheCounters>,
    maintenance: Arc<MaintenanceTask>,
    daemon: Mutex<Option<MaintenanceDaemon>>,
    index: RwLock<Option<Arc<ResourceIndex>>>,
    index_load: tokio::sync::Mutex<()>,
    loaded_categories: Mutex<HashSet<String>>,
    runtime: Handle,
    shutdown: CancellationToken,
}

impl<S: RemoteAssetStore> AssetCache<S> {
    /// Creates the cache and starts its maintenance daemon.
    ///
    /// Must be called from within a Tokio runtime; that runtime runs all
    /// background work, including fetches started by
    /// [`get_thumbnail_sync`](Self::get_thumbnail_sync).
    pub fn start(config: AssetCacheConfig, store: S) -> Result<Arc<Self>, CacheError> {
        let runtime = Handle::try_current().map_err(|e| CacheError::Spawn(e.to_string()))?;
        let shutdown = CancellationToken::new();

        let store = Arc::new(store);
        let disk = Arc::new(DiskCache::new(config.cache_dir()));
        let models = Arc::new(MemoryCache::new("models"));
        let thumbnails = Arc::new(MemoryCache::new("thumbnails"));
        let counters = Arc::new(CacheCounters::new());

        let fetcher = Fetcher {
            store: Arc::clone(&store),
            disk: Arc::clone(&disk),
            counters: Arc::clone(&counters),
            remote_root: Arc::from(config.remote_root()),
            model_max_bytes: config.max_bytes(AssetKind::Model),
            thumbnail_max_bytes: config.max_bytes(AssetKind::Thumbnail),
            decode: DecodeOptions {
                thumbnail_size: config.thumbnail_size(),
            },
        };

        let maintenance = Arc::new(MaintenanceTask::new(
            Arc::clone(&disk),
            Arc::clone(&models),
            Arc::clone(&thumbnails),
            Arc::clone(&counters),
            config.maintenance_limits(),
        ));
        let daemon = MaintenanceDaemon::start(
            Arc::clone(&maintenance),
            config.maintenance_interval(),
            shutdown.child_token(),
        );

        info!(
            cache_dir = %config.cache_dir().display(),
            disk_budget = config.disk_budget(),
            batch_concurrency = config.batch_concurrency(),
            remote_root = config.remote_root(),
            "Asset cache started"
        );

        Ok(Arc::new(Self {
            batch: BatchLoader::new(config.batch_concurrency()),
            model_requests: RequestCoordinator::new("model", shutdown.child_token()),
            thumbnail_requests: RequestCoordinator::new("thumbnail", shutdown.child_token()),
            config,
            store,
            fetcher,
            disk,
            models,
            thumbnails,
            counters,
            maintenance,
            daemon: Mutex::new(Some(daemon)),
            index: RwLock::new(None),
            index_load: tokio::sync::Mutex::new(()),
            loaded_categories: Mutex::new(HashSet::new()),
            runtime,
            shutdown,
        }))
    }

    pub fn config(&self) -> &AssetCacheConfig {
        &self.config
    }

    /// Returns the model, fetching it on a cache miss.
    pub async fn get_model(&self, name: &str) -> Result<ModelAsset, AssetError> {
        let key = AssetKey::new(name)?;
        self.get_asset(key, &self.models, &self.model_requests, None)
            .await
    }

    /// Returns the thumbnail at the configured size, fetching it on a miss.
    pub async fn get_thumbnail(&self, name: &str) -> Result<Thumbnail, AssetError> {
        let key = AssetKey::new(name)?;
        self.get_asset(key, &self.thumbnails, &self.thumbnail_requests, None)
            .await
    }

    /// Like [`get_thumbnail`](Self::get_thumbnail) but gives up after
    /// `timeout`, or the configured sync timeout when `None`.
    ///
    /// The fetch itself keeps running and still populates the cache.
    pub async fn get_thumbnail_within(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Option<Thumbnail> {
        let timeout = timeout.unwrap_or(self.config.sync_timeout());
        match tokio::time::timeout(timeout, self.get_thumbnail(name)).await {
            Ok(Ok(thumbnail)) => Some(thumbnail),
            Ok(Err(e)) => {
                debug!(name, error = %e, "Thumbnail unavailable");
                None
            }
            Err(_) => {
                debug!(name, timeout_ms = timeout.as_millis() as u64, "Thumbnail wait timed out");
                None
            }
        }
    }

    /// Blocking thumbnail lookup for threads outside the runtime.
    ///
    /// Checks memory, then reads and decodes the disk entry on the calling
    /// thread, then hands a fetch to the cache's runtime and waits at most
    /// `timeout` (default: the configured sync timeout) for it. Returns
    /// `None` on timeout or failure; the fetch keeps running and populates
    /// the cache.
    ///
    /// Do not call from a runtime worker thread: the wait blocks the thread.
    pub fn get_thumbnail_sync(
        self: &Arc<Self>,
        name: &str,
        timeout: Option<Duration>,
    ) -> Option<Thumbnail> {
        let timeout = timeout.unwrap_or(self.config.sync_timeout());
        let key = AssetKey::new(name).ok()?;

        if let Some(thumbnail) = self.thumbnails.get(&key) {
            self.counters.record_memory_hit();
            return Some(thumbnail);
        }

        match self.disk.read_blocking(&key, AssetKind::Thumbnail) {
            Ok(Some(data)) => match <Thumbnail as CachedAsset>::decode(&key, data, self.fetcher.decode) {
                Ok(thumbnail) => {
                    self.counters.record_memory_miss();
                    self.counters.record_disk_hit();
                    self.thumbnails.put(key, thumbnail.clone());
                    return Some(thumbnail);
                }
                // The async path removes the corrupt file and refetches
                Err(e) => debug!(name, error = %e, "Cached thumbnail undecodable"),
            },
            Ok(None) => {}
            Err(e) => warn!(name, error = %e, "Disk cache read failed"),
        }

        let (tx, rx) = mpsc::channel();
        let cache = Arc::clone(self);
        let name_owned = name.to_string();
        self.runtime.spawn(async move {
            let result = cache.get_thumbnail(&name_owned).await;
            // The waiter may have timed out already
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(thumbnail)) => Some(thumbnail),
            Ok(Err(e)) => {
                debug!(name, error = %e, "Thumbnail unavailable");
                None
            }
            Err(_) => {
                debug!(name, timeout_ms = timeout.as_millis() as u64, "Thumbnail wait timed out");
                None
            }
        }
    }

    /// Loads every model of `category` with bounded concurrency.
    ///
    /// A category is remembered as loaded only when every model succeeded;
    /// later calls for it return an empty report without touching the store.
    pub async fn load_category(&self, category: &str) -> Result<BatchReport<ModelAsset>, AssetError> {
        if self.loaded_categories.lock().contains(category) {
            debug!(category, "Category already loaded");
            return Ok(BatchReport::empty());
        }

        let index = self.load_index().await?;
        let keys = index
            .keys_for(category)
            .ok_or_else(|| AssetError::UnknownCategory(category.to_string()))?;

        info!(category, models = keys.len(), "Loading category");
        let report = self
            .batch
            .load_all(keys, |key, limiter| {
                self.get_asset(key, &self.models, &self.model_requests, Some(limiter))
            })
            .await;

        if report.is_complete_success() {
            self.loaded_categories.lock().insert(category.to_string());
        } else {
            warn!(
                category,
                failed = report.failed().len(),
                "Category loaded with failures"
            );
        }
        Ok(report)
    }

    /// Loads thumbnails for `names` with bounded concurrency.
    ///
    /// Blank names are skipped.
    pub async fn load_thumbnails<I, N>(&self, names: I) -> BatchReport<Thumbnail>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let keys: Vec<AssetKey> = names
            .into_iter()
            .filter_map(|name| match AssetKey::new(name.as_ref()) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "Skipping thumbnail");
                    None
                }
            })
            .collect();

        self.batch
            .load_all(keys, |key, limiter| {
                self.get_asset(key, &self.thumbnails, &self.thumbnail_requests, Some(limiter))
            })
            .await
    }

    /// Empties both memory caches, the disk cache, and the loaded-category set.
    ///
    /// Fetches in flight finish normally and land in the emptied cache.
    pub async fn clear_cache(&self) -> Result<(), CacheError> {
        self.models.clear();
        self.thumbnails.clear();
        self.loaded_categories.lock().clear();
        self.disk.clear().await?;
        info!("Asset cache cleared");
        Ok(())
    }

    /// Returns the resource index, downloading it on first use.
    pub async fn load_index(&self) -> Result<Arc<ResourceIndex>, AssetError> {
        if let Some(index) = self.index() {
            return Ok(index);
        }

        let _loading = self.index_load.lock().await;
        // Another caller may have finished while this one waited
        if let Some(index) = self.index() {
            return Ok(index);
        }
        self.download_index().await
    }

    /// Downloads the resource index again, replacing the current one.
    pub async fn refresh_index(&self) -> Result<Arc<ResourceIndex>, AssetError> {
        let _loading = self.index_load.lock().await;
        self.download_index().await
    }

    async fn download_index(&self) -> Result<Arc<ResourceIndex>, AssetError> {
        if self.shutdown.is_cancelled() {
            return Err(AssetError::Cancelled);
        }

        let index = ResourceIndex::load(
            self.store.as_ref(),
            self.config.remote_root(),
            self.config.default_categories(),
            self.config.index_max_bytes(),
        )
        .await?;

        let index = Arc::new(index);
        *self.index.write() = Some(Arc::clone(&index));
        Ok(index)
    }

    /// The loaded index, if any.
    pub fn index(&self) -> Option<Arc<ResourceIndex>> {
        self.index.read().clone()
    }

    pub fn is_index_loaded(&self) -> bool {
        self.index.read().is_some()
    }

    /// Main categories in display order. Empty until the index is loaded.
    pub fn categories(&self) -> Vec<String> {
        self.index()
            .map(|index| index.categories().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn subcategories(&self, category: &str) -> Vec<String> {
        self.index()
            .map(|index| {
                index
                    .subcategories(category)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn models(&self, category: &str, subcategory: &str) -> Vec<String> {
        self.index()
            .map(|index| index.models(category, subcategory).to_vec())
            .unwrap_or_default()
    }

    pub fn colors(&self) -> Vec<Color> {
        self.index()
            .map(|index| index.colors().to_vec())
            .unwrap_or_default()
    }

    /// Returns true if `category` finished loading without failures.
    pub fn is_category_loaded(&self, category: &str) -> bool {
        self.loaded_categories.lock().contains(category)
    }

    /// Snapshot of cache activity.
    pub fn stats(&self) -> CacheStatistics {
        let models = self.model_requests.stats();
        let thumbnails = self.thumbnail_requests.stats();

        CacheStatistics {
            model_entries: self.models.len(),
            thumbnail_entries: self.thumbnails.len(),
            total_requests: models.total_requests + thumbnails.total_requests,
            coalesced_requests: models.coalesced_requests + thumbnails.coalesced_requests,
            in_flight: self.model_requests.in_flight_count()
                + self.thumbnail_requests.in_flight_count(),
            ..self.counters.snapshot()
        }
    }

    /// Current size of the disk cache in bytes.
    pub async fn disk_usage(&self) -> Result<u64, CacheError> {
        self.disk.size_of().await
    }

    /// Runs one maintenance cycle now.
    pub async fn run_maintenance(&self) -> MaintenanceReport {
        self.maintenance.run_once().await
    }

    /// Stops the maintenance daemon and cancels in-flight fetches.
    ///
    /// Waiters of cancelled fetches get [`AssetError::Cancelled`]; later
    /// fetches fail the same way. Cached assets stay readable.
    pub fn shutdown(&self) {
        if let Some(daemon) = self.begin_shutdown() {
            daemon.shutdown();
        }
    }

    /// Like [`shutdown`](Self::shutdown), then waits for the maintenance
    /// daemon to exit.
    pub async fn close(&self) {
        if let Some(daemon) = self.begin_shutdown() {
            daemon.shutdown();
            daemon.join().await;
        }
    }

    fn begin_shutdown(&self) -> Option<MaintenanceDaemon> {
        if self.shutdown.is_cancelled() {
            return None;
        }
        self.shutdown.cancel();
        self.model_requests.log_stats();
        self.thumbnail_requests.log_stats();
        info!("Asset cache shut down");
        self.daemon.lock().take()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Returns true while the maintenance daemon runs.
    pub fn is_maintenance_running(&self) -> bool {
        self.daemon
            .lock()
            .as_ref()
            .is_some_and(MaintenanceDaemon::is_running)
    }

    async fn get_asset<A: CachedAsset>(
        &self,
        key: AssetKey,
        memory: &Arc<MemoryCache<A>>,
        requests: &RequestCoordinator<A>,
        limiter: Option<Arc<ConcurrencyLimiter>>,
    ) -> Result<A, AssetError> {
        if let Some(asset) = memory.get(&key) {
            self.counters.record_memory_hit();
            return Ok(asset);
        }
        self.counters.record_memory_miss();

        let fetcher = self.fetcher.clone();
        let memory = Arc::clone(memory);
        requests
            .fetch(key.clone(), move || fetcher.load(key, memory, limiter))
            .await
    }
}

impl<S: RemoteAssetStore> Drop for AssetCache<S> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

