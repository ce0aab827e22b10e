//! Cache statistics tracking and reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::format_size;

/// Live counters, updated lock-free from any task.
#[derive(Debug)]
pub struct CacheCounters {
    memory_hits: AtomicU64,
    memory_misses: AtomicU64,
    memory_evictions: AtomicU64,
    disk_hits: AtomicU64,
    disk_misses: AtomicU64,
    disk_writes: AtomicU64,
    disk_write_failures: AtomicU64,
    disk_evictions: AtomicU64,
    disk_bytes_evicted: AtomicU64,
    downloads: AtomicU64,
    download_failures: AtomicU64,
    bytes_downloaded: AtomicU64,
    created_at: Instant,
}

impl Default for CacheCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheCounters {
    pub fn new() -> Self {
        Self {
            memory_hits: AtomicU64::new(0),
            memory_misses: AtomicU64::new(0),
            memory_evictions: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            disk_misses: AtomicU64::new(0),
            disk_writes: AtomicU64::new(0),
            disk_write_failures: AtomicU64::new(0),
            disk_evictions: AtomicU64::new(0),
            disk_bytes_evicted: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
            download_failures: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn record_memory_hit(&self) {
        Self::bump(&self.memory_hits, 1);
    }

    pub fn record_memory_miss(&self) {
        Self::bump(&self.memory_misses, 1);
    }

    pub fn record_memory_evictions(&self, count: u64) {
        Self::bump(&self.memory_evictions, count);
    }

    pub fn record_disk_hit(&self) {
        Self::bump(&self.disk_hits, 1);
    }

    pub fn record_disk_miss(&self) {
        Self::bump(&self.disk_misses, 1);
    }

    pub fn record_disk_write(&self) {
        Self::bump(&self.disk_writes, 1);
    }

    pub fn record_disk_write_failure(&self) {
        Self::bump(&self.disk_write_failures, 1);
    }

    pub fn record_disk_eviction(&self, files: u64, bytes: u64) {
        Self::bump(&self.disk_evictions, files);
        Self::bump(&self.disk_bytes_evicted, bytes);
    }

    pub fn record_download(&self, bytes: u64) {
        Self::bump(&self.downloads, 1);
        Self::bump(&self.bytes_downloaded, bytes);
    }

    pub fn record_download_failure(&self) {
        Self::bump(&self.download_failures, 1);
    }

    /// Copies the counters into a snapshot. Gauges start at zero.
    pub fn snapshot(&self) -> CacheStatistics {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CacheStatistics {
            memory_hits: load(&self.memory_hits),
            memory_misses: load(&self.memory_misses),
            memory_evictions: load(&self.memory_evictions),
            disk_hits: load(&self.disk_hits),
            disk_misses: load(&self.disk_misses),
            disk_writes: load(&self.disk_writes),
            disk_write_failures: load(&self.disk_write_failures),
            disk_evictions: load(&self.disk_evictions),
            disk_bytes_evicted: load(&self.disk_bytes_evicted),
            downloads: load(&self.downloads),
            download_failures: load(&self.download_failures),
            bytes_downloaded: load(&self.bytes_downloaded),
            uptime: self.created_at.elapsed(),
            ..Default::default()
        }
    }
}

/// Point-in-time view of cache activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStatistics {
    // Memory cache
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub memory_evictions: u64,
    pub model_entries: usize,
    pub thumbnail_entries: usize,

    // Disk cache
    pub disk_hits: u64,
    pub disk_misses: u64,
    pub disk_writes: u64,
    pub disk_write_failures: u64,
    pub disk_evictions: u64,
    pub disk_bytes_evicted: u64,

    // Downloads
    pub downloads: u64,
    pub download_failures: u64,
    pub bytes_downloaded: u64,

    // Request coalescing
    pub total_requests: u64,
    pub coalesced_requests: u64,
    pub in_flight: usize,

    pub uptime: Duration,
}

fn ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

impl CacheStatistics {
    /// Memory cache hit rate (0.0 to 1.0).
    pub fn memory_hit_rate(&self) -> f64 {
        ratio(self.memory_hits, self.memory_misses)
    }

    /// Disk cache hit rate (0.0 to 1.0).
    pub fn disk_hit_rate(&self) -> f64 {
        ratio(self.disk_hits, self.disk_misses)
    }

    /// Fraction of lookups served without a download.
    pub fn overall_hit_rate(&self) -> f64 {
        ratio(self.memory_hits + self.disk_hits, self.disk_misses)
    }

    /// Fraction of fetch requests that joined an in-flight fetch.
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }

    /// Format statistics as a human-readable report.
    pub fn format(&self) -> String {
        format!(
            r#"Asset Cache Statistics

MEMORY CACHE
  Models:      {}
  Thumbnails:  {}
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Evictions:   {}

DISK CACHE
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
  Writes:      {}
  Failures:    {}
  Evictions:   {} ({})

DOWNLOADS
  Total:       {}
  Failures:    {}
  Bytes:       {}

REQUESTS
  Total:       {}
  Coalesced:   {} ({:.1}%)
  In flight:   {}

OVERALL
  Hit Rate:    {:.1}%
  Uptime:      {}s
"#,
            self.model_entries,
            self.thumbnail_entries,
            self.memory_hits,
            self.memory_misses,
            self.memory_hit_rate() * 100.0,
            self.memory_evictions,
            self.disk_hits,
            self.disk_misses,
            self.disk_hit_rate() * 100.0,
            self.disk_writes,
            self.disk_write_failures,
            self.disk_evictions,
            format_size(self.disk_bytes_evicted),
            self.downloads,
            self.download_failures,
            format_size(self.bytes_downloaded),
            self.total_requests,
            self.coalesced_requests,
            self.coalescing_ratio() * 100.0,
            self.in_flight,
            self.overall_hit_rate() * 100.0,
            self.uptime.as_secs(),
        )
    }
}
