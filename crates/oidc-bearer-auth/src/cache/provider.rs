//! Storage seam behind the verification cache

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheResult;
use super::key::CacheKey;

/// Counters reported by a backend
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub size_bytes: Option<u64>,
    pub entry_count: Option<u64>,
}

/// Async key/value store holding encoded verification results
///
/// Async so a networked backend can sit behind the same interface.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Stored bytes for `key`; expired entries read as absent
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value`, expiring `ttl` from now. `None` keeps it until evicted.
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    /// Drop `key`, reporting whether an entry was removed
    async fn delete(&self, key: &CacheKey) -> CacheResult<bool>;

    async fn stats(&self) -> CacheStats;
}
