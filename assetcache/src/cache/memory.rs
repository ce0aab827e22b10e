//! In-memory cache of decoded assets.
//!
//! One generic cache serves every [`AssetKind`](crate::asset::AssetKind);
//! the facade keeps one instance per kind. Inserting never evicts. Entry
//! bounds are enforced out of band by [`MemoryCache::trim_to`], which the
//! maintenance daemon calls on its schedule, so callers must tolerate an
//! entry disappearing between two lookups.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::asset::AssetKey;

/// Entry in the memory cache.
#[derive(Debug, Clone)]
struct CacheEntry<A> {
    /// Cached asset
    asset: A,
    /// Logical clock value of the last access, for LRU trimming
    last_access: u64,
    /// Number of times accessed
    access_count: u64,
}

/// Concurrent key to decoded-asset map.
pub struct MemoryCache<A> {
    entries: DashMap<AssetKey, CacheEntry<A>>,
    clock: AtomicU64,
    label: &'static str,
}

impl<A: Clone> MemoryCache<A> {
    /// Creates an empty cache. `label` only appears in log output.
    pub fn new(label: &'static str) -> Self {
        Self {
            entries: DashMap::new(),
            clock: AtomicU64::new(0),
            label,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns a clone of the cached asset and refreshes its access time.
    pub fn get(&self, key: &AssetKey) -> Option<A> {
        let tick = self.tick();
        self.entries.get_mut(key).map(|mut entry| {
            entry.last_access = tick;
            entry.access_count += 1;
            entry.asset.clone()
        })
    }

    /// Inserts or replaces an entry.
    pub fn put(&self, key: AssetKey, asset: A) {
        let entry = CacheEntry {
            asset,
            last_access: self.tick(),
            access_count: 0,
        };
        self.entries.insert(key, entry);
    }

    /// Removes an entry, returning true if it was present.
    pub fn remove(&self, key: &AssetKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes least recently accessed entries until at most `max_entries` remain.
    ///
    /// Returns the number of entries removed.
    pub fn trim_to(&self, max_entries: usize) -> usize {
        let len = self.entries.len();
        if len <= max_entries {
            return 0;
        }

        let mut by_age: Vec<(AssetKey, u64)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().last_access))
            .collect();
        by_age.sort_by_key(|(_, last_access)| *last_access);

        let excess = by_age.len().saturating_sub(max_entries);
        let removed = by_age
            .into_iter()
            .take(excess)
            .filter(|(key, _)| self.entries.remove(key).is_some())
            .count();

        tracing::debug!(
            cache = self.label,
            removed,
            remaining = self.entries.len(),
            "Trimmed memory cache"
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> AssetKey {
        AssetKey::new(name).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let cache = MemoryCache::new("test");
        cache.put(key("tops_blue_01"), 1u32);

        assert_eq!(cache.get(&key("tops_blue_01")), Some(1));
        assert_eq!(cache.get(&key("tops_red_01")), None);
        assert!(cache.contains(&key("tops_blue_01")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = MemoryCache::new("test");
        cache.put(key("a"), 1u32);
        cache.put(key("a"), 2u32);

        assert_eq!(cache.get(&key("a")), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_never_evicts() {
        let cache = MemoryCache::new("test");
        for i in 0..500u32 {
            cache.put(key(&format!("k{}", i)), i);
        }
        assert_eq!(cache.len(), 500);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = MemoryCache::new("test");
        cache.put(key("a"), 1u32);
        cache.put(key("b"), 2u32);

        assert!(cache.remove(&key("a")));
        assert!(!cache.remove(&key("a")));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_trim_removes_least_recently_accessed() {
        let cache = MemoryCache::new("test");
        cache.put(key("a"), 1u32);
        cache.put(key("b"), 2u32);
        cache.put(key("c"), 3u32);

        // Touch "a" so "b" becomes the oldest
        cache.get(&key("a"));

        let removed = cache.trim_to(2);
        assert_eq!(removed, 1);
        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
    }

    #[test]
    fn test_trim_under_limit_is_noop() {
        let cache = MemoryCache::new("test");
        cache.put(key("a"), 1u32);
        assert_eq!(cache.trim_to(5), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_trim_to_zero() {
        let cache = MemoryCache::new("test");
        cache.put(key("a"), 1u32);
        cache.put(key("b"), 2u32);
        assert_eq!(cache.trim_to(0), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(MemoryCache::new("test"));
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100u32 {
                        let k = key(&format!("k{}", i));
                        cache.put(k.clone(), t);
                        cache.get(&k);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 100);
    }
}
