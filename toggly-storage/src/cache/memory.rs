//! In-memory cache backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::{CacheBackend, CacheKey, CacheResult, CacheStats};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            Some(ttl) => (now - self.cached_at)
                .to_std()
                .map(|age| age >= ttl)
                .unwrap_or(false),
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    flushed: AtomicU64,
    evictions: AtomicU64,
}

/// Concurrent in-memory cache backed by a `DashMap`.
///
/// Entries optionally expire after a TTL. When `max_entries` is set and the
/// map is full, inserting a new key evicts the oldest entry. The bound is
/// approximate while `set` calls race; each `set` trims back down to it
/// after inserting, so the map is within bounds once writers go quiet.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheBackend {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    counters: Arc<Counters>,
    ttl: Option<Duration>,
    max_entries: Option<usize>,
}

impl InMemoryCacheBackend {
    /// Unbounded cache without expiry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Whether an entry exists for `key`, without touching hit/miss counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().cached_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            if self.entries.remove(&key).is_some() {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache entry evicted at capacity");
            }
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let now = Utc::now();
        let found = self
            .entries
            .get(key)
            .map(|entry| (entry.value().clone(), entry.is_expired(self.ttl, now)));

        match found {
            Some((entry, false)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.value))
            }
            Some((_, true)) => {
                self.entries.remove(key);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Cache entry expired");
                Ok(None)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, value: Vec<u8>) -> CacheResult<()> {
        if let Some(max) = self.max_entries {
            if max == 0 {
                return Ok(());
            }
            if !self.entries.contains_key(key) && self.entries.len() >= max {
                self.evict_oldest();
            }
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                cached_at: Utc::now(),
            },
        );
        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                self.evict_oldest();
            }
        }
        Ok(())
    }

    async fn flush(&self, keys: &[CacheKey]) -> CacheResult<()> {
        let mut removed = 0u64;
        for key in keys {
            if self.entries.remove(key).is_some() {
                removed += 1;
            }
        }
        self.counters.flushed.fetch_add(removed, Ordering::Relaxed);
        debug!(requested = keys.len(), removed, "Cache keys flushed");
        Ok(())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Ok(CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            flushed: self.counters.flushed.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        })
    }
}
