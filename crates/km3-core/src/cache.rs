//! Memo cache for decoded columns.
//!
//! Decoded columns are immutable once materialized, so caching by
//! (branch name, event range) is safe and eliminates redundant source reads
//! when the same branch is touched repeatedly (selection then projection,
//! say). The cache is owned by a reader session — never process-wide — so
//! invalidation is simply the session's lifetime.
//!
//! Capacity is bounded by decoded bytes, not entry count. Eviction removes
//! the least-recently-used entry by access-stamp scan: a session holds tens
//! of large columns, so the scan is noise next to a source read.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use crate::jagged::Jagged;

/// Configuration for the column cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum total bytes of decoded columns to keep. Default: 128 MiB.
    pub max_bytes: usize,
    /// When `false`, `get`/`insert` are no-ops.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_bytes: 128 * 1024 * 1024, enabled: true }
    }
}

impl CacheConfig {
    /// A disabled (no-op) cache config.
    pub fn disabled() -> Self {
        Self { max_bytes: 0, enabled: false }
    }
}

/// A decoded column in any of the shapes a source can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedColumn {
    /// One f64 per event.
    F64(Vec<f64>),
    /// One i64 per event.
    I64(Vec<i64>),
    /// Ragged f64 column.
    JaggedF64(Jagged<f64>),
    /// Ragged i64 column.
    JaggedI64(Jagged<i64>),
}

impl CachedColumn {
    /// Approximate decoded size in bytes (values + offsets).
    pub fn byte_size(&self) -> usize {
        match self {
            CachedColumn::F64(v) => v.len() * 8,
            CachedColumn::I64(v) => v.len() * 8,
            CachedColumn::JaggedF64(j) => j.n_values() * 8 + j.offsets().len() * 8,
            CachedColumn::JaggedI64(j) => j.n_values() * 8 + j.offsets().len() * 8,
        }
    }
}

/// Cache key: branch name plus the event range it was decoded for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ColumnKey {
    branch: String,
    start: usize,
    end: usize,
}

struct CacheEntry {
    data: Arc<CachedColumn>,
    size: usize,
    /// Monotonic access stamp; smallest is least recently used.
    stamp: u64,
}

struct Inner {
    map: HashMap<ColumnKey, CacheEntry>,
    current_bytes: usize,
    max_bytes: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl Inner {
    fn new(max_bytes: usize) -> Self {
        Self { map: HashMap::new(), current_bytes: 0, max_bytes, clock: 0, hits: 0, misses: 0 }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, key: &ColumnKey) -> Option<Arc<CachedColumn>> {
        let stamp = self.tick();
        match self.map.get_mut(key) {
            Some(entry) => {
                entry.stamp = stamp;
                self.hits += 1;
                Some(Arc::clone(&entry.data))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn evict_lru(&mut self) -> bool {
        let victim = self
            .map
            .iter()
            .min_by_key(|(_, entry)| entry.stamp)
            .map(|(key, _)| key.clone());
        match victim {
            Some(key) => {
                if let Some(entry) = self.map.remove(&key) {
                    self.current_bytes -= entry.size;
                }
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, key: ColumnKey, column: CachedColumn) -> Arc<CachedColumn> {
        let size = column.byte_size();

        // An entry larger than the whole budget is returned uncached.
        if size > self.max_bytes {
            return Arc::new(column);
        }

        if let Some(old) = self.map.remove(&key) {
            self.current_bytes -= old.size;
        }
        while self.current_bytes + size > self.max_bytes {
            if !self.evict_lru() {
                break;
            }
        }

        let arc = Arc::new(column);
        let stamp = self.tick();
        self.map.insert(key, CacheEntry { data: Arc::clone(&arc), size, stamp });
        self.current_bytes += size;
        arc
    }
}

/// Thread-safe memo cache for decoded columns, keyed by branch and range.
pub struct ColumnCache {
    inner: Mutex<Inner>,
    enabled: bool,
}

impl ColumnCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self { inner: Mutex::new(Inner::new(config.max_bytes)), enabled: config.enabled }
    }

    /// Look up a decoded column. `None` on miss or when disabled.
    pub fn get(&self, branch: &str, range: Range<usize>) -> Option<Arc<CachedColumn>> {
        if !self.enabled {
            return None;
        }
        let key = ColumnKey { branch: branch.to_string(), start: range.start, end: range.end };
        self.inner.lock().unwrap().get(&key)
    }

    /// Insert a decoded column, evicting least-recently-used entries to fit.
    pub fn insert(
        &self,
        branch: &str,
        range: Range<usize>,
        column: CachedColumn,
    ) -> Arc<CachedColumn> {
        if !self.enabled {
            return Arc::new(column);
        }
        let key = ColumnKey { branch: branch.to_string(), start: range.start, end: range.end };
        self.inner.lock().unwrap().insert(key, column)
    }

    /// Get-or-decode: returns the cached column or materializes it via `f`.
    pub fn get_or_insert<F, E>(
        &self,
        branch: &str,
        range: Range<usize>,
        f: F,
    ) -> std::result::Result<Arc<CachedColumn>, E>
    where
        F: FnOnce() -> std::result::Result<CachedColumn, E>,
    {
        if let Some(cached) = self.get(branch, range.clone()) {
            return Ok(cached);
        }
        let column = f()?;
        Ok(self.insert(branch, range, column))
    }

    /// Cache statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            entries: inner.map.len(),
            current_bytes: inner.current_bytes,
            max_bytes: inner.max_bytes,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Drop all cached columns.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.map.clear();
        inner.current_bytes = 0;
    }
}

impl Default for ColumnCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Snapshot of cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Number of cached columns.
    pub entries: usize,
    /// Current total bytes.
    pub current_bytes: usize,
    /// Configured maximum bytes.
    pub max_bytes: usize,
    /// Hits since creation.
    pub hits: u64,
    /// Misses since creation.
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate in [0.0, 1.0].
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(n: usize) -> CachedColumn {
        CachedColumn::F64(vec![0.0; n])
    }

    #[test]
    fn basic_insert_and_get() {
        let cache = ColumnCache::new(CacheConfig { max_bytes: 1024, enabled: true });
        assert!(cache.get("trks.E", 0..10).is_none());

        cache.insert("trks.E", 0..10, col(10));
        let cached = cache.get("trks.E", 0..10).unwrap();
        assert_eq!(*cached, col(10));

        // A different range is a different column.
        assert!(cache.get("trks.E", 0..5).is_none());

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.current_bytes, 80);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn evicts_lru_when_full() {
        let cache = ColumnCache::new(CacheConfig { max_bytes: 200, enabled: true });
        cache.insert("a", 0..10, col(10)); // 80 bytes
        cache.insert("b", 0..10, col(10)); // 160 bytes
        cache.get("a", 0..10).unwrap(); // refresh a

        cache.insert("c", 0..10, col(10)); // evicts b, the LRU
        assert!(cache.get("b", 0..10).is_none());
        assert!(cache.get("a", 0..10).is_some());
        assert!(cache.get("c", 0..10).is_some());
    }

    #[test]
    fn oversized_entry_not_cached() {
        let cache = ColumnCache::new(CacheConfig { max_bytes: 64, enabled: true });
        let arc = cache.insert("big", 0..100, col(100));
        assert_eq!(arc.byte_size(), 800);
        assert!(cache.get("big", 0..100).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn disabled_cache_is_noop() {
        let cache = ColumnCache::new(CacheConfig::disabled());
        cache.insert("a", 0..10, col(10));
        assert!(cache.get("a", 0..10).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn get_or_insert_decodes_once() {
        let cache = ColumnCache::new(CacheConfig { max_bytes: 1024, enabled: true });
        let first: std::result::Result<_, ()> = cache.get_or_insert("a", 0..3, || Ok(col(3)));
        assert_eq!(*first.unwrap(), col(3));

        let second: std::result::Result<_, ()> =
            cache.get_or_insert("a", 0..3, || panic!("column already cached"));
        assert_eq!(*second.unwrap(), col(3));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ColumnCache::new(CacheConfig { max_bytes: 1024, enabled: true });
        cache.insert("a", 0..3, col(3));
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.stats().current_bytes, 0);
        assert!(cache.get("a", 0..3).is_none());
    }
}
