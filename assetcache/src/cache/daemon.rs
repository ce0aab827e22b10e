//! Background cache maintenance.
//!
//! Once at start and then on a fixed interval, the daemon
//! - evicts the oldest disk files until the disk budget holds, and
//! - trims the model and thumbnail memory caches to their entry limits.
//!
//! Maintenance never runs on the fetch path.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CacheCounters, DiskCache, EvictionResult, MemoryCache};
use crate::asset::{ModelAsset, Thumbnail};

/// Limits enforced by one maintenance cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceLimits {
    pub disk_max_bytes: u64,
    pub model_max_entries: usize,
    pub thumbnail_max_entries: usize,
}

/// Outcome of one maintenance cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// `None` if the disk scan failed
    pub disk: Option<EvictionResult>,
    pub models_trimmed: usize,
    pub thumbnails_trimmed: usize,
}

/// The caches a maintenance cycle operates on.
pub struct MaintenanceTask {
    disk: Arc<DiskCache>,
    models: Arc<MemoryCache<ModelAsset>>,
    thumbnails: Arc<MemoryCache<Thumbnail>>,
    counters: Arc<CacheCounters>,
    limits: MaintenanceLimits,
}

impl MaintenanceTask {
    pub fn new(
        disk: Arc<DiskCache>,
        models: Arc<MemoryCache<ModelAsset>>,
        thumbnails: Arc<MemoryCache<Thumbnail>>,
        counters: Arc<CacheCounters>,
        limits: MaintenanceLimits,
    ) -> Self {
        Self {
            disk,
            models,
            thumbnails,
            counters,
            limits,
        }
    }

    pub fn limits(&self) -> MaintenanceLimits {
        self.limits
    }

    /// Runs one maintenance cycle.
    pub async fn run_once(&self) -> MaintenanceReport {
        let disk = match self.disk.evict_to_budget(self.limits.disk_max_bytes).await {
            Ok(result) => {
                self.counters
                    .record_disk_eviction(result.files_deleted as u64, result.bytes_freed);
                Some(result)
            }
            Err(e) => {
                warn!(error = %e, "Disk cache eviction failed");
                None
            }
        };

        let models_trimmed = self.models.trim_to(self.limits.model_max_entries);
        let thumbnails_trimmed = self.thumbnails.trim_to(self.limits.thumbnail_max_entries);
        self.counters
            .record_memory_evictions((models_trimmed + thumbnails_trimmed) as u64);

        let report = MaintenanceReport {
            disk,
            models_trimmed,
            thumbnails_trimmed,
        };
        debug!(?report, "Maintenance cycle complete");
        report
    }
}

/// Handle to the running maintenance task.
pub struct MaintenanceDaemon {
    handle: JoinHandle<()>,
    cancellation: CancellationToken,
}

impl MaintenanceDaemon {
    /// Spawns the daemon onto the current runtime.
    ///
    /// The daemon stops when `cancellation` (or a parent token) is cancelled.
    pub fn start(
        task: Arc<MaintenanceTask>,
        interval: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        let token = cancellation.clone();
        let handle = tokio::spawn(async move {
            run_daemon(task, interval, token).await;
        });

        Self {
            handle,
            cancellation,
        }
    }

    /// Signals the daemon to stop. Non-blocking.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
    }

    /// Returns true until the daemon task has exited.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Waits for the daemon task to exit.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Maintenance daemon task failed");
        }
    }
}

async fn run_daemon(task: Arc<MaintenanceTask>, interval: Duration, cancellation: CancellationToken) {
    let limits = task.limits();
    info!(
        disk_max_bytes = limits.disk_max_bytes,
        model_max_entries = limits.model_max_entries,
        thumbnail_max_entries = limits.thumbnail_max_entries,
        interval_secs = interval.as_secs(),
        "Starting cache maintenance daemon"
    );

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = task.run_once() => {}
        }

        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Cache maintenance daemon shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetKey;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn model(name: &str) -> (AssetKey, ModelAsset) {
        let key = AssetKey::new(name).unwrap();
        let asset = ModelAsset::decode(&key, Bytes::from_static(b"usdz")).unwrap();
        (key, asset)
    }

    fn task(temp_dir: &TempDir, limits: MaintenanceLimits) -> (Arc<MaintenanceTask>, Arc<MemoryCache<ModelAsset>>) {
        let models = Arc::new(MemoryCache::new("models"));
        let task = Arc::new(MaintenanceTask::new(
            Arc::new(DiskCache::new(temp_dir.path())),
            Arc::clone(&models),
            Arc::new(MemoryCache::new("thumbnails")),
            Arc::new(CacheCounters::new()),
            limits,
        ));
        (task, models)
    }

    const LIMITS: MaintenanceLimits = MaintenanceLimits {
        disk_max_bytes: 1000,
        model_max_entries: 2,
        thumbnail_max_entries: 2,
    };

    #[tokio::test]
    async fn test_run_once_trims_and_evicts() {
        let temp_dir = TempDir::new().unwrap();
        let (task, models) = task(&temp_dir, LIMITS);

        for name in ["a", "b", "c", "d"] {
            let (key, asset) = model(name);
            models.put(key, asset);
        }
        std::fs::create_dir_all(temp_dir.path().join("models")).unwrap();
        std::fs::write(temp_dir.path().join("models/x.usdz"), vec![0u8; 800]).unwrap();
        std::fs::write(temp_dir.path().join("models/y.usdz"), vec![0u8; 800]).unwrap();

        let report = task.run_once().await;

        assert_eq!(report.models_trimmed, 2);
        assert_eq!(models.len(), 2);
        let disk = report.disk.unwrap();
        assert_eq!(disk.files_deleted, 1);
        assert!(disk.size_after <= 1000);
    }

    #[tokio::test]
    async fn test_daemon_runs_at_start_and_stops_on_cancel() {
        let temp_dir = TempDir::new().unwrap();
        let (task, models) = task(&temp_dir, LIMITS);
        for name in ["a", "b", "c"] {
            let (key, asset) = model(name);
            models.put(key, asset);
        }

        let token = CancellationToken::new();
        let daemon = MaintenanceDaemon::start(task, Duration::from_secs(3600), token.clone());

        // The initial cycle trims without waiting for the interval
        for _ in 0..100 {
            if models.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(models.len(), 2);
        assert!(daemon.is_running());

        daemon.shutdown();
        tokio::time::timeout(Duration::from_secs(5), daemon.join())
            .await
            .expect("daemon should stop after cancellation");
    }
}
