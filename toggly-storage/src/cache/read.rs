//! Cache read results.
//!
//! Reads through the caching decorator return [`CacheRead<T>`], which tells
//! the caller whether the value came from the cache or from the wrapped
//! service.

use chrono::{DateTime, Utc};

/// Where a read was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Deserialized from a cache entry.
    Cache,
    /// Computed by the wrapped service.
    Origin,
}

/// Result of a read through the cache, with its provenance.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    fetched_at: DateTime<Utc>,
    source: ReadSource,
}

impl<T> CacheRead<T> {
    /// A value served from a cache entry.
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
            source: ReadSource::Cache,
        }
    }

    /// A value computed by the wrapped service (miss or cache disabled).
    pub fn from_origin(value: T) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
            source: ReadSource::Origin,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    /// Check if this was a cache hit.
    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    /// When the read completed.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_read_from_cache() {
        let read = CacheRead::from_cache("value".to_string());
        assert!(read.was_cache_hit());
        assert_eq!(read.source(), ReadSource::Cache);
        assert_eq!(read.value(), "value");
    }

    #[test]
    fn test_cache_read_from_origin() {
        let read = CacheRead::from_origin(42);
        assert!(!read.was_cache_hit());
        assert_eq!(read.into_value(), 42);
    }
}
