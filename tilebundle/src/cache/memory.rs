//! In-memory cache with TTL expiry and LRU eviction.

use crate::cache::r#trait::CacheStore;
use crate::cache::types::{CacheError, CacheStats};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Longest lifetime an entry can get; larger TTLs are capped.
pub const MAX_ENTRY_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Entry in the memory cache.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Bytes,
    expires_at: Instant,
    /// Last access time for LRU eviction
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(data: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            expires_at: now + ttl.min(MAX_ENTRY_TTL),
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    size_bytes: usize,
    stats: CacheStats,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.size_bytes = self.size_bytes.saturating_sub(entry.data.len());
        Some(entry)
    }

    fn sync_size_stats(&mut self) {
        self.stats.size_bytes = self.size_bytes;
        self.stats.entry_count = self.entries.len();
    }

    /// Drops expired entries, then least recently used ones, until
    /// `required` more bytes fit under `max`.
    fn make_room(&mut self, required: usize, max: usize) {
        if self.size_bytes + required <= max {
            return;
        }

        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            self.remove(&key);
            self.stats.expirations += 1;
        }

        let target = max.saturating_sub(required);
        if self.size_bytes <= target {
            return;
        }

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.last_accessed))
            .collect();
        by_age.sort_by_key(|(_, accessed)| *accessed);

        for (key, _) in by_age {
            if self.size_bytes <= target {
                break;
            }
            self.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

/// In-process [`CacheStore`].
///
/// Bounded by total payload size. Expired entries are dropped lazily on
/// lookup and whenever room is needed.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_size_bytes: usize,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_size_bytes` of values.
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_size_bytes,
        }
    }

    pub fn get_entry(&self, key: &str) -> Option<Bytes> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Instant::now();

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                let data = entry.data.clone();
                inner.stats.hits += 1;
                return Some(data);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.remove(key);
            inner.stats.expirations += 1;
            inner.sync_size_stats();
        }
        inner.stats.misses += 1;
        None
    }

    /// Stores `data` under `key`, evicting as needed.
    ///
    /// A value larger than the whole cache is rejected and nothing is evicted.
    pub fn put_entry(&self, key: &str, data: Bytes, ttl: Duration) -> Result<(), CacheError> {
        if data.len() > self.max_size_bytes {
            return Err(CacheError::TooLarge {
                size: data.len(),
                max: self.max_size_bytes,
            });
        }

        let mut inner = self.inner.lock();
        inner.remove(key);
        inner.make_room(data.len(), self.max_size_bytes);

        inner.size_bytes += data.len();
        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(data, ttl));
        inner.sync_size_stats();
        Ok(())
    }

    pub fn remove_entry(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.remove(key).is_some();
        inner.sync_size_stats();
        removed
    }

    /// Checks for a live entry without touching statistics or LRU order.
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.lock();
        inner
            .entries
            .get(key)
            .is_some_and(|e| !e.is_expired(Instant::now()))
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.inner.lock().size_bytes
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.size_bytes = 0;
        inner.sync_size_stats();
    }
}

impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Bytes> {
        self.get_entry(key)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.put_entry(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.remove_entry(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn data(len: usize) -> Bytes {
        Bytes::from(vec![0u8; len])
    }

    #[test]
    fn test_memory_cache_new() {
        let cache = MemoryCache::new(1_000_000);
        assert_eq!(cache.max_size_bytes(), 1_000_000);
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size_bytes(), 0);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(1_000_000);
        cache
            .set("bundle:a", Bytes::from_static(b"abc"), MINUTE)
            .await
            .unwrap();

        assert_eq!(cache.get("bundle:a").await, Some(Bytes::from_static(b"abc")));
        assert_eq!(cache.get("bundle:b").await, None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(1_000_000);
        cache.set("k", data(10), MINUTE).await.unwrap();
        cache.delete("k").await.unwrap();

        assert!(!cache.contains("k"));
        assert_eq!(cache.size_bytes(), 0);
        // Deleting again is fine
        cache.delete("k").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new(1_000_000);
        cache
            .set("manifest", data(100), Duration::from_secs(300))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("manifest").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("manifest").await.is_none());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(cache.size_bytes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(2500);

        cache.set("a", data(1000), MINUTE).await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set("b", data(1000), MINUTE).await.unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;

        // Touch "a" so "b" becomes the oldest
        cache.get("a").await;
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.set("c", data(1000), MINUTE).await.unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.size_bytes() <= 2500);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_dropped_before_live_ones() {
        let cache = MemoryCache::new(2000);

        cache
            .set("short", data(1000), Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.set("long", data(1000), MINUTE).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        cache.set("new", data(1000), MINUTE).await.unwrap();

        assert!(cache.contains("long"));
        assert!(cache.contains("new"));
        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[tokio::test]
    async fn test_replace_existing_updates_size() {
        let cache = MemoryCache::new(1_000_000);
        cache.set("k", data(100), MINUTE).await.unwrap();
        cache.set("k", data(40), MINUTE).await.unwrap();

        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.size_bytes(), 40);
    }

    #[tokio::test]
    async fn test_oversized_entry_is_rejected() {
        let cache = MemoryCache::new(1000);
        cache.set("small", data(500), MINUTE).await.unwrap();

        let err = cache.set("huge", data(5000), MINUTE).await.unwrap_err();
        assert_eq!(
            err,
            CacheError::TooLarge {
                size: 5000,
                max: 1000
            }
        );
        assert!(cache.contains("small"));
        assert!(!cache.contains("huge"));
        assert_eq!(cache.size_bytes(), 500);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test]
    async fn test_entry_exactly_at_capacity_fits() {
        let cache = MemoryCache::new(1000);
        cache.set("small", data(500), MINUTE).await.unwrap();
        cache.set("full", data(1000), MINUTE).await.unwrap();

        assert!(!cache.contains("small"));
        assert!(cache.contains("full"));
        assert_eq!(cache.size_bytes(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_is_capped() {
        let cache = MemoryCache::new(1000);
        cache
            .set("k", data(10), Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        assert!(cache.contains("k"));

        tokio::time::advance(MAX_ENTRY_TTL).await;
        assert!(!cache.contains("k"));
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new(1_000_000);
        cache.put_entry("k", data(10), MINUTE).unwrap();
        cache.clear();
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size_bytes(), 0);
    }
}
