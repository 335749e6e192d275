//! Cache backend trait and statistics.

use async_trait::async_trait;
use toggly_core::CacheError;

use super::CacheKey;

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache backend trait for pluggable cache implementations.
///
/// Implementations must be safe for concurrent get/set/flush from many
/// tasks; the caching decorator adds no locking of its own.
///
/// # Serialization
///
/// Values are opaque bytes. The decorator stores JSON, but a backend must
/// not depend on that.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache. Returns `None` on a miss.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Put a value into the cache, replacing any previous entry.
    async fn set(&self, key: &CacheKey, value: Vec<u8>) -> CacheResult<()>;

    /// Evict the given keys. Missing keys are ignored.
    async fn flush(&self, keys: &[CacheKey]) -> CacheResult<()>;

    /// Get cache statistics.
    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries removed by `flush`.
    pub flushed: u64,
    /// Number of evictions due to capacity or expiry.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_without_traffic_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
