//! On-disk cache of raw asset bytes.
//!
//! # File Layout
//!
//! ```text
//! {root}/models/{escaped_key}.usdz
//! {root}/thumbnails/{escaped_key}.jpg
//! ```
//!
//! Keys are escaped byte-wise so that any key maps to exactly one safe
//! file name and two different keys never collide. Writes go to a
//! `.partial-*` temp file in the target directory and are renamed into
//! place, so readers never observe a half-written file.
//!
//! All filesystem work runs on the blocking thread pool.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use super::eviction::{self, DiskEntry, EvictionResult};
use super::CacheError;
use crate::asset::{AssetKey, AssetKind};

/// Prefix of temp files used for atomic writes.
const PARTIAL_PREFIX: &str = ".partial-";

/// Persistent byte store keyed by (kind, key).
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the cached file for `key`. Pure; touches no files.
    pub fn path(&self, key: &AssetKey, kind: AssetKind) -> PathBuf {
        self.root.join(kind.directory()).join(format!(
            "{}.{}",
            escape_file_name(key.as_str()),
            kind.extension()
        ))
    }

    /// Reads the cached bytes, or `None` if nothing is cached.
    pub async fn read(&self, key: &AssetKey, kind: AssetKind) -> Result<Option<Bytes>, CacheError> {
        let path = self.path(key, kind);
        run_blocking(move || match std::fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        })
        .await
    }

    /// Reads the cached bytes on the calling thread.
    ///
    /// For callers outside the async runtime.
    pub fn read_blocking(&self, key: &AssetKey, kind: AssetKind) -> Result<Option<Bytes>, CacheError> {
        match std::fs::read(self.path(key, kind)) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Atomically writes `data`, replacing any previous entry.
    pub async fn write(&self, key: &AssetKey, kind: AssetKind, data: Bytes) -> Result<(), CacheError> {
        let path = self.path(key, kind);
        run_blocking(move || write_atomic(&path, &data)).await
    }

    /// Removes the cached file. Returns true if a file was deleted.
    pub async fn remove(&self, key: &AssetKey, kind: AssetKind) -> Result<bool, CacheError> {
        let path = self.path(key, kind);
        run_blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        })
        .await
    }

    pub async fn contains(&self, key: &AssetKey, kind: AssetKind) -> bool {
        let path = self.path(key, kind);
        run_blocking(move || Ok(path.is_file())).await.unwrap_or(false)
    }

    /// Total bytes of cached files. Scans the whole tree.
    pub async fn size_of(&self) -> Result<u64, CacheError> {
        let entries = self.entries().await?;
        Ok(entries.iter().map(|e| e.size).sum())
    }

    /// Every cached file with its modification time and size.
    pub async fn entries(&self) -> Result<Vec<DiskEntry>, CacheError> {
        let root = self.root.clone();
        run_blocking(move || Ok(eviction::collect_cache_files(&root))).await
    }

    /// Deletes the oldest files until the cache fits in `max_bytes`.
    pub async fn evict_to_budget(&self, max_bytes: u64) -> Result<EvictionResult, CacheError> {
        let root = self.root.clone();
        run_blocking(move || Ok(eviction::evict_to_budget_blocking(&root, max_bytes))).await
    }

    /// Deletes everything under the root and recreates the empty root.
    pub async fn clear(&self) -> Result<(), CacheError> {
        let root = self.root.clone();
        run_blocking(move || {
            match std::fs::remove_dir_all(&root) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::Io(e)),
            }
            std::fs::create_dir_all(&root)?;
            info!(dir = %root.display(), "Disk cache cleared");
            Ok(())
        })
        .await
    }
}

/// Escapes a key into a file name.
///
/// `[A-Za-z0-9._-]` pass through; every other byte, and a leading `.`,
/// becomes `%XX`. Since `%` is itself escaped the mapping is injective.
pub(crate) fn escape_file_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-');
        if plain && !(i == 0 && byte == b'.') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let dir = path
        .parent()
        .ok_or_else(|| CacheError::Io(std::io::Error::new(ErrorKind::InvalidInput, "no parent directory")))?;
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(PARTIAL_PREFIX)
        .tempfile_in(dir)?;
    temp.write_all(data)?;
    temp.persist(path).map_err(|e| CacheError::Io(e.error))?;

    debug!(path = %path.display(), bytes = data.len(), "Wrote disk cache entry");
    Ok(())
}

async fn run_blocking<T, F>(f: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CacheError::Spawn(e.to_string()))?
}
