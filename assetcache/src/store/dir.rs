//! Store backed by a local mirror directory.
//!
//! Useful for development and for serving assets that were synced to disk
//! out of band. Paths are resolved relative to the mirror root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{RemoteAssetStore, StoreError};

/// Serves `<root>/<remote_path>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Mirror root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, remote_path: &str) -> Option<PathBuf> {
        let relative = Path::new(remote_path.trim_start_matches('/'));
        // Only plain components; no escaping the mirror root.
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

impl RemoteAssetStore for DirAssetStore {
    async fn fetch(&self, remote_path: &str, max_bytes: u64) -> Result<Vec<u8>, StoreError> {
        let path = self
            .resolve(remote_path)
            .ok_or_else(|| StoreError::NotFound(remote_path.to_string()))?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(StoreError::NotFound(remote_path.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(remote_path.to_string()))
            }
            Err(e) => return Err(StoreError::Transport(e.to_string())),
        };

        if metadata.len() > max_bytes {
            return Err(StoreError::SizeExceeded {
                path: remote_path.to_string(),
                limit: max_bytes,
            });
        }

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(remote_path.to_string()),
            _ => StoreError::Transport(e.to_string()),
        })
    }
}
