//! Disk cache eviction.
//!
//! Eviction approximates LRU with file modification time: the oldest files
//! are deleted first until the cache fits the budget. Files whose name
//! starts with `.` are in-progress writes and are neither counted nor
//! deleted.
//!
//! If the newest remaining file alone exceeds the budget it is kept, so a
//! pass can end above the budget with exactly one file left.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tracing::{debug, info, warn};

/// Result of an eviction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionResult {
    /// Number of files deleted
    pub files_deleted: usize,
    /// Total bytes freed
    pub bytes_freed: u64,
    /// Cache size before eviction
    pub size_before: u64,
    /// Cache size after eviction
    pub size_after: u64,
    /// Duration of eviction in milliseconds
    pub duration_ms: u64,
}

impl EvictionResult {
    /// Returns true if the pass deleted anything.
    pub fn evicted(&self) -> bool {
        self.files_deleted > 0
    }
}

/// A cached file as seen by a directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// Returns true for files written by an in-progress atomic write.
pub(crate) fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Collect all cache files with their mtime and size.
pub(crate) fn collect_cache_files(cache_dir: &Path) -> Vec<DiskEntry> {
    let mut files = Vec::new();
    collect_files_recursive(cache_dir, &mut files);
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<DiskEntry>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(
                dir = %dir.display(),
                error = %e,
                "Failed to read directory during cache scan"
            );
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if is_partial(&path) {
            continue;
        } else if let Ok(metadata) = entry.metadata() {
            files.push(DiskEntry {
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size: metadata.len(),
                path,
            });
        }
    }
}

/// Delete oldest files until the cache holds at most `max_bytes`.
pub(crate) fn evict_to_budget_blocking(cache_dir: &Path, max_bytes: u64) -> EvictionResult {
    let start = Instant::now();
    let mut files = collect_cache_files(cache_dir);
    let size_before: u64 = files.iter().map(|f| f.size).sum();

    if size_before <= max_bytes {
        debug!(
            size_bytes = size_before,
            limit_bytes = max_bytes,
            "Disk cache under budget, no eviction needed"
        );
        return EvictionResult {
            size_before,
            size_after: size_before,
            duration_ms: start.elapsed().as_millis() as u64,
            ..Default::default()
        };
    }

    info!(
        size_bytes = size_before,
        limit_bytes = max_bytes,
        file_count = files.len(),
        "Disk cache over budget, starting eviction"
    );

    files.sort_by_key(|f| f.modified);

    let mut bytes_freed = 0u64;
    let mut files_deleted = 0usize;
    let mut delete_failures = 0usize;
    let mut remaining_size = size_before;
    let mut remaining_files = files.len();

    for file in files {
        if remaining_size <= max_bytes || remaining_files <= 1 {
            break;
        }

        match std::fs::remove_file(&file.path) {
            Ok(()) => {
                bytes_freed += file.size;
                remaining_size = remaining_size.saturating_sub(file.size);
                files_deleted += 1;
            }
            Err(e) => {
                // Another writer may have replaced or removed it
                delete_failures += 1;
                debug!(
                    path = %file.path.display(),
                    error = %e,
                    "Failed to delete cache file during eviction"
                );
            }
        }
        remaining_files -= 1;
    }

    if delete_failures > 0 {
        info!(
            delete_failures,
            "Some files could not be deleted during eviction"
        );
    }

    if remaining_size > max_bytes {
        warn!(
            remaining_size,
            max_bytes,
            shortfall_bytes = remaining_size - max_bytes,
            "Eviction could not reach budget"
        );
    }

    cleanup_empty_dirs(cache_dir);

    let result = EvictionResult {
        files_deleted,
        bytes_freed,
        size_before,
        size_after: remaining_size,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    log_eviction_result(&result);
    result
}

/// Remove empty directories below `dir`, depth-first. `dir` itself is kept.
pub(crate) fn cleanup_empty_dirs(dir: &Path) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            cleanup_empty_dirs(&path);
            // Fails silently if not empty
            let _ = std::fs::remove_dir(&path);
        }
    }
}

fn log_eviction_result(result: &EvictionResult) {
    info!(
        files_deleted = result.files_deleted,
        bytes_freed = result.bytes_freed,
        size_before = result.size_before,
        size_after = result.size_after,
        duration_ms = result.duration_ms,
        "Disk cache eviction complete"
    );
}
