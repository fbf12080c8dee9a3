//! In-memory cache implementation with TTL support

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;

use super::config::DEFAULT_MAX_VALUE_SIZE;
use super::error::{CacheError, CacheResult};
use super::key::CacheKey;
use super::provider::{CacheProvider, CacheStats};

/// Cache entry with value and expiration
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// In-memory cache stats (internal)
#[derive(Default)]
struct InMemoryStats {
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
    evictions: u64,
}

/// Thread-safe in-memory cache with TTL support
///
/// Time is read from `tokio::time::Instant`, so tests running on a paused
/// runtime control expiry deterministically with `tokio::time::advance`.
///
/// # Eviction Behavior
///
/// When `max_entries` is reached, expired entries are purged first. If the
/// cache is still full, the entry closest to expiry is evicted.
///
/// A TTL too large to represent as an instant is stored without expiry.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    stats: Arc<RwLock<InMemoryStats>>,
    max_entries: Option<usize>,
    max_value_size: usize,
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("max_entries", &self.max_entries)
            .field("max_value_size", &self.max_value_size)
            .field("entry_count", &self.store.read().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(InMemoryStats::default())),
            max_entries: None,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    #[must_use]
    pub const fn with_max_value_size(mut self, max: usize) -> Self {
        self.max_value_size = max;
        self
    }

    /// Make room for one new entry. Returns the number of entries removed.
    fn evict_for_insert(store: &mut HashMap<String, CacheEntry>, max: usize, now: Instant) -> u64 {
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));

        if store.len() >= max {
            let victim = store
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at.map_or((1, now), |exp| (0, exp)))
                .map(|(key, _)| key.clone());
            if let Some(key) = victim {
                store.remove(&key);
            }
        }

        (before - store.len()) as u64
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let key_str = key.to_key_string();
        let now = Instant::now();
        let store = self.store.read();

        match store.get(&key_str) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                drop(store);
                self.stats.write().hits += 1;
                Ok(Some(value))
            }
            Some(_) => {
                drop(store);
                // Re-check under the write lock; a fresh entry may have replaced it
                let mut store = self.store.write();
                if store.get(&key_str).is_some_and(|e| e.is_expired(now)) {
                    store.remove(&key_str);
                }
                drop(store);
                self.stats.write().misses += 1;
                Ok(None)
            }
            None => {
                drop(store);
                self.stats.write().misses += 1;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        if value.len() > self.max_value_size {
            return Err(CacheError::ValueTooLarge {
                size: value.len(),
                max: self.max_value_size,
            });
        }

        let key_str = key.to_key_string();
        let now = Instant::now();
        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: ttl.and_then(|d| now.checked_add(d)),
        };

        let mut store = self.store.write();

        let evicted = match self.max_entries {
            Some(max) if store.len() >= max && !store.contains_key(&key_str) => {
                Self::evict_for_insert(&mut store, max, now)
            }
            _ => 0,
        };

        store.insert(key_str, entry);
        drop(store);

        let mut stats = self.stats.write();
        stats.sets += 1;
        stats.evictions += evicted;

        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        let key_str = key.to_key_string();
        let removed = self.store.write().remove(&key_str).is_some();

        if removed {
            self.stats.write().deletes += 1;
        }

        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let store = self.store.read();

        let (entry_count, size_bytes) = store
            .values()
            .filter(|e| !e.is_expired(now))
            .fold((0u64, 0u64), |(count, size), e| {
                (count + 1, size + e.value.len() as u64)
            });
        drop(store);

        let stats = self.stats.read();
        CacheStats {
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            deletes: stats.deletes,
            evictions: stats.evictions,
            size_bytes: Some(size_bytes),
            entry_count: Some(entry_count),
        }
    }
}
