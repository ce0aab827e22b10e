//! Concurrency-limited batch loading.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use super::ConcurrencyLimiter;
use crate::asset::AssetKey;
use crate::error::AssetError;

/// Default number of concurrent remote fetches per batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

/// Per-key outcome of a batch load.
#[derive(Debug, Clone)]
pub struct BatchReport<A> {
    results: HashMap<AssetKey, Result<A, AssetError>>,
}

impl<A> Default for BatchReport<A> {
    fn default() -> Self {
        Self {
            results: HashMap::new(),
        }
    }
}

impl<A> BatchReport<A> {
    /// A report with no keys.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, key: &AssetKey) -> Option<&Result<A, AssetError>> {
        self.results.get(key)
    }

    /// Keys that loaded, sorted.
    pub fn succeeded(&self) -> Vec<&AssetKey> {
        let mut keys: Vec<_> = self
            .results
            .iter()
            .filter_map(|(k, r)| r.is_ok().then_some(k))
            .collect();
        keys.sort();
        keys
    }

    /// Keys that failed with their errors, sorted by key.
    pub fn failed(&self) -> Vec<(&AssetKey, &AssetError)> {
        let mut failures: Vec<_> = self
            .results
            .iter()
            .filter_map(|(k, r)| r.as_ref().err().map(|e| (k, e)))
            .collect();
        failures.sort_by(|a, b| a.0.cmp(b.0));
        failures
    }

    /// True when no key failed. An empty report counts as success.
    pub fn is_complete_success(&self) -> bool {
        self.results.values().all(Result::is_ok)
    }

    pub fn into_results(self) -> HashMap<AssetKey, Result<A, AssetError>> {
        self.results
    }
}

/// Loads many keys concurrently while bounding remote fetches.
#[derive(Debug, Clone, Copy)]
pub struct BatchLoader {
    limit: usize,
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_CONCURRENCY)
    }
}

impl BatchLoader {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Loads every distinct key with `load_fn`.
    ///
    /// All keys start at once. `load_fn` receives a limiter shared by the
    /// whole batch and must hold one of its permits around each remote
    /// store call, so keys served from cache or joined to an in-flight
    /// fetch do not count against the limit. A failing key never affects
    /// the others.
    pub async fn load_all<A, I, F, Fut>(&self, keys: I, load_fn: F) -> BatchReport<A>
    where
        I: IntoIterator<Item = AssetKey>,
        F: Fn(AssetKey, Arc<ConcurrencyLimiter>) -> Fut,
        Fut: Future<Output = Result<A, AssetError>>,
    {
        let mut seen = HashSet::new();
        let keys: Vec<AssetKey> = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();
        if keys.is_empty() {
            return BatchReport::empty();
        }

        let limiter = Arc::new(ConcurrencyLimiter::new(self.limit, "batch"));
        debug!(keys = keys.len(), limit = self.limit, "Starting batch load");

        let loads = keys.into_iter().map(|key| {
            let load = load_fn(key.clone(), Arc::clone(&limiter));
            async move { (key, load.await) }
        });
        let results: HashMap<_, _> = join_all(loads).await.into_iter().collect();

        let report = BatchReport { results };
        info!(
            total = report.len(),
            failed = report.failed().len(),
            peak_fetches = limiter.peak_in_flight(),
            "Batch load complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn keys(names: &[&str]) -> Vec<AssetKey> {
        names.iter().map(|n| AssetKey::new(n).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_failures_are_independent() {
        let loader = BatchLoader::default();
        let report = loader
            .load_all(keys(&["bad", "good"]), |key, _limiter| async move {
                if key.as_str() == "bad" {
                    Err(AssetError::NotFound {
                        path: key.to_string(),
                    })
                } else {
                    Ok(key.as_str().len())
                }
            })
            .await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.succeeded(), vec![&AssetKey::new("good").unwrap()]);
        assert_eq!(report.failed().len(), 1);
        assert!(!report.is_complete_success());
        assert!(matches!(
            report.get(&AssetKey::new("bad").unwrap()),
            Some(Err(AssetError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_limit_bounds_permit_holders() {
        let loader = BatchLoader::new(3);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let names: Vec<String> = (0..10).map(|i| format!("k{}", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let report = loader
            .load_all(keys(&names), |_key, limiter| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let _permit = limiter.acquire().await?;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert!(report.is_complete_success());
        assert_eq!(report.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_duplicate_keys_load_once() {
        let loader = BatchLoader::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let report = loader
            .load_all(keys(&["a", "a", "b"]), |_key, _limiter| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert_eq!(report.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report: BatchReport<()> = BatchLoader::default()
            .load_all(Vec::new(), |_key, _limiter| async { Ok(()) })
            .await;
        assert!(report.is_empty());
        assert!(report.is_complete_success());
    }
}
