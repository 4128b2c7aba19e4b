//! Kernel cache implementation
//!
//! LRU cache of kernel matrix rows for the SMO solver. Each SMO step needs
//! the full rows `Q_i` and `Q_j` of the two updated variables; rows are
//! computed on demand and the least recently used row is evicted when the
//! memory budget is exhausted.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Rows always kept, so both rows of a working pair fit at once
const MIN_ROWS: usize = 2;

/// LRU cache of kernel rows keyed by sample index
pub struct KernelCache {
    rows: LruCache<usize, Arc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache holding at most `capacity` rows (at least two)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(MIN_ROWS)).unwrap_or(NonZeroUsize::MIN);
        Self {
            rows: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache sized from a memory budget in bytes for rows of length `row_len`
    pub fn with_memory_limit(memory_bytes: usize, row_len: usize) -> Self {
        let row_bytes = row_len.max(1) * std::mem::size_of::<f64>();
        Self::new(memory_bytes / row_bytes)
    }

    /// Get a cached row, updating its recency
    pub fn get(&mut self, i: usize) -> Option<Arc<[f64]>> {
        if let Some(row) = self.rows.get(&i) {
            self.hits += 1;
            Some(Arc::clone(row))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Insert a row, evicting the least recently used one if full
    pub fn put(&mut self, i: usize, row: Vec<f64>) -> Arc<[f64]> {
        let row: Arc<[f64]> = row.into();
        self.rows.put(i, Arc::clone(&row));
        row
    }

    /// Return row `i`, computing and caching it on a miss
    pub fn get_or_insert_with<F>(&mut self, i: usize, compute: F) -> Arc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        match self.get(i) {
            Some(row) => row,
            None => self.put(i, compute()),
        }
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.rows.cap().get(),
            size: self.rows.len(),
        }
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.rows.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Maximum number of rows
    pub capacity: usize,
    /// Rows currently held
    pub size: usize,
}
