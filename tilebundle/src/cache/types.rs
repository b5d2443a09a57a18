//! Cache errors and statistics.

use thiserror::Error;

/// Cache-related errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The backing cache service rejected or failed the operation
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The value alone exceeds the cache capacity
    #[error("value of {size} bytes exceeds cache capacity of {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Counters for a cache store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries dropped because their TTL passed
    pub expirations: u64,
    pub size_bytes: usize,
    pub entry_count: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit rate from 0.0 to 1.0.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
