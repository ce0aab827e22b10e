//! The miss path shared by every asset kind: disk, then remote store.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::asset::{remote_path, AssetKey, AssetKind, ModelAsset, Thumbnail};
use crate::cache::{CacheCounters, DiskCache, MemoryCache};
use crate::error::AssetError;
use crate::loader::ConcurrencyLimiter;
use crate::store::RemoteAssetStore;

/// Parameters needed to decode raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecodeOptions {
    pub thumbnail_size: u32,
}

/// A decoded asset type the cache can hold.
pub(crate) trait CachedAsset: Clone + Send + Sync + 'static {
    const KIND: AssetKind;

    /// Decodes raw bytes. CPU-bound; call off the async executor.
    fn decode(key: &AssetKey, data: Bytes, options: DecodeOptions) -> Result<Self, AssetError>;
}

impl CachedAsset for ModelAsset {
    const KIND: AssetKind = AssetKind::Model;

    fn decode(key: &AssetKey, data: Bytes, _options: DecodeOptions) -> Result<Self, AssetError> {
        ModelAsset::decode(key, data)
    }
}

impl CachedAsset for Thumbnail {
    const KIND: AssetKind = AssetKind::Thumbnail;

    fn decode(key: &AssetKey, data: Bytes, options: DecodeOptions) -> Result<Self, AssetError> {
        Thumbnail::decode(key, &data, options.thumbnail_size, options.thumbnail_size)
    }
}

/// Everything a fetch task needs, cheap to clone into spawned tasks.
pub(crate) struct Fetcher<S> {
    pub store: Arc<S>,
    pub disk: Arc<DiskCache>,
    pub counters: Arc<CacheCounters>,
    pub remote_root: Arc<str>,
    pub model_max_bytes: u64,
    pub thumbnail_max_bytes: u64,
    pub decode: DecodeOptions,
}

impl<S> Clone for Fetcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            disk: Arc::clone(&self.disk),
            counters: Arc::clone(&self.counters),
            remote_root: Arc::clone(&self.remote_root),
            model_max_bytes: self.model_max_bytes,
            thumbnail_max_bytes: self.thumbnail_max_bytes,
            decode: self.decode,
        }
    }
}

impl<S: RemoteAssetStore> Fetcher<S> {
    fn max_bytes(&self, kind: AssetKind) -> u64 {
        match kind {
            AssetKind::Model => self.model_max_bytes,
            AssetKind::Thumbnail => self.thumbnail_max_bytes,
        }
    }

    /// Loads `key` from disk or the store and populates both caches.
    ///
    /// When `limiter` is set, one of its permits is held around the store
    /// call only.
    pub async fn load<A: CachedAsset>(
        self,
        key: AssetKey,
        memory: Arc<MemoryCache<A>>,
        limiter: Option<Arc<ConcurrencyLimiter>>,
    ) -> Result<A, AssetError> {
        // A fetch that completed just before this one started
        if let Some(asset) = memory.get(&key) {
            return Ok(asset);
        }

        if let Some(asset) = self.load_from_disk::<A>(&key).await {
            memory.put(key, asset.clone());
            return Ok(asset);
        }
        self.counters.record_disk_miss();

        let data = self.download(&key, A::KIND, limiter.as_deref()).await?;
        let asset = self.decode_blocking::<A>(&key, data.clone()).await?;

        match self.disk.write(&key, A::KIND, data).await {
            Ok(()) => self.counters.record_disk_write(),
            Err(e) => {
                self.counters.record_disk_write_failure();
                warn!(key = %key, kind = %A::KIND, error = %e, "Failed to write disk cache");
            }
        }

        memory.put(key, asset.clone());
        Ok(asset)
    }

    /// Returns the decoded disk entry, or `None` on a miss.
    ///
    /// Read errors count as a miss. Undecodable files are deleted.
    async fn load_from_disk<A: CachedAsset>(&self, key: &AssetKey) -> Option<A> {
        let data = match self.disk.read(key, A::KIND).await {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, kind = %A::KIND, error = %e, "Disk cache read failed");
                return None;
            }
        };

        match self.decode_blocking::<A>(key, data).await {
            Ok(asset) => {
                self.counters.record_disk_hit();
                debug!(key = %key, kind = %A::KIND, "Disk cache hit");
                Some(asset)
            }
            Err(e) => {
                warn!(key = %key, kind = %A::KIND, error = %e, "Discarding corrupt disk cache entry");
                if let Err(e) = self.disk.remove(key, A::KIND).await {
                    warn!(key = %key, error = %e, "Failed to remove corrupt disk cache entry");
                }
                None
            }
        }
    }

    async fn download(
        &self,
        key: &AssetKey,
        kind: AssetKind,
        limiter: Option<&ConcurrencyLimiter>,
    ) -> Result<Bytes, AssetError> {
        let path = remote_path(&self.remote_root, kind, key.as_str());

        let result = {
            let _permit = match limiter {
                Some(limiter) => Some(limiter.acquire().await?),
                None => None,
            };
            debug!(key = %key, path = %path, "Fetching from remote store");
            self.store.fetch(&path, self.max_bytes(kind)).await
        };

        match result {
            Ok(data) => {
                self.counters.record_download(data.len() as u64);
                Ok(Bytes::from(data))
            }
            Err(e) => {
                self.counters.record_download_failure();
                debug!(key = %key, path = %path, error = %e, "Remote fetch failed");
                Err(e.into())
            }
        }
    }

    async fn decode_blocking<A: CachedAsset>(&self, key: &AssetKey, data: Bytes) -> Result<A, AssetError> {
        let options = self.decode;
        let owned_key = key.clone();
        tokio::task::spawn_blocking(move || A::decode(&owned_key, data, options))
            .await
            .map_err(|e| AssetError::decode(key.as_str(), format!("decoder task failed: {}", e)))?
    }
}
