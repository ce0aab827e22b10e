//! Remote asset store abstraction.
//!
//! The cache never talks to the network directly; it asks a
//! [`RemoteAssetStore`] for the bytes at a logical remote path. This keeps
//! transport concerns out of the cache and lets tests substitute an
//! in-memory store.

mod dir;
mod http;

pub use dir::DirAssetStore;
pub use http::{HttpAssetStore, DEFAULT_TIMEOUT};

use std::future::Future;
use thiserror::Error;

/// Errors a remote store can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing exists at the requested path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The object is larger than the caller allowed.
    #[error("{path} exceeds the {limit} byte limit")]
    SizeExceeded { path: String, limit: u64 },

    /// Connection, protocol, or I/O failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Source of raw asset bytes.
///
/// Implementations must enforce `max_bytes` and fail with
/// [`StoreError::SizeExceeded`] rather than return a larger payload.
pub trait RemoteAssetStore: Send + Sync + 'static {
    /// Fetch the object at `remote_path`.
    ///
    /// # Arguments
    ///
    /// * `remote_path` - Path relative to the store root, e.g.
    ///   `avatar_assets/models/clothes/tops/tops_blue_01.usdz`
    /// * `max_bytes` - Largest payload the caller accepts
    fn fetch(
        &self,
        remote_path: &str,
        max_bytes: u64,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store used by unit tests.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves objects from a map and counts every call.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        calls: Mutex<Vec<String>>,
        active: AtomicUsize,
        peak_active: AtomicUsize,
        delay: Mutex<Option<Duration>>,
    }

    impl MemoryStore {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
            self.objects.lock().insert(path.into(), data);
        }

        pub(crate) fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        pub(crate) fn peak_active(&self) -> usize {
            self.peak_active.load(Ordering::SeqCst)
        }
    }

    impl RemoteAssetStore for MemoryStore {
        async fn fetch(&self, remote_path: &str, max_bytes: u64) -> Result<Vec<u8>, StoreError> {
            self.calls.lock().push(remote_path.to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_active.fetch_max(now, Ordering::SeqCst);

            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let result = match self.objects.lock().get(remote_path) {
                Some(data) if data.len() as u64 > max_bytes => Err(StoreError::SizeExceeded {
                    path: remote_path.to_string(),
                    limit: max_bytes,
                }),
                Some(data) => Ok(data.clone()),
                None => Err(StoreError::NotFound(remote_path.to_string())),
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}
