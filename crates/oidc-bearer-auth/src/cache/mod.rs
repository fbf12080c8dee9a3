//! Storage for verification results
//!
//! Provides pluggable cache backends with a unified async interface and the
//! [`VerificationCache`] that memoizes provider answers on top of them.
//!
//! # Available Backends
//!
//! - [`NoopCache`] - No-op implementation (caching disabled)
//! - [`InMemoryCache`] - Thread-safe in-memory cache with TTL support
//!
//! # Observability
//!
//! Wrap any cache with [`TracedCache`] to add tracing spans and logging.
//!
//! # Keys
//!
//! Entries are stored under `authentication.{userinfo|introspect}.{sha256(token)}`.
//! The raw token never reaches the backend, and the scope keeps a userinfo
//! answer from being served for an introspection lookup of the same token.

mod config;
mod error;
mod key;
mod memory;
mod noop;
mod provider;
mod traced;
mod verification;

use std::sync::Arc;

pub use config::{CacheBackend, CacheConfig, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_VALUE_SIZE};
pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, VerificationScope};
pub use memory::InMemoryCache;
pub use noop::NoopCache;
pub use provider::{CacheProvider, CacheStats};
pub use traced::TracedCache;
pub use verification::VerificationCache;

use crate::constants::SERVICE_NAME;

/// Create a cache provider based on configuration
#[must_use]
pub fn create_cache(config: &CacheConfig) -> Arc<dyn CacheProvider> {
    match config.backend {
        CacheBackend::Noop => Arc::new(NoopCache::new()),
        CacheBackend::Memory => {
            let mut cache = InMemoryCache::new().with_max_value_size(config.max_value_size);

            if let Some(max) = config.max_entries {
                cache = cache.with_max_entries(max);
            }

            Arc::new(TracedCache::new(cache, SERVICE_NAME))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::BearerToken;

    fn key() -> CacheKey {
        CacheKey::for_token(VerificationScope::Userinfo, &BearerToken::new("T1"))
    }

    #[tokio::test]
    async fn test_create_cache_noop() {
        let config = CacheConfig::new().with_backend(CacheBackend::Noop);
        let cache = create_cache(&config);

        cache.set(&key(), b"{}", None).await.unwrap();
        assert!(cache.get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_cache_memory_functional() {
        let config = CacheConfig::new().with_max_entries(Some(100));
        let cache = create_cache(&config);

        cache
            .set(&key(), b"{\"sub\":\"u1\"}", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(cache.get(&key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_cache_memory_with_custom_max_value_size() {
        let config = CacheConfig::new().with_max_value_size(100);
        let cache = create_cache(&config);

        let small_value = vec![0u8; 50];
        cache.set(&key(), &small_value, None).await.unwrap();
        assert!(cache.get(&key()).await.unwrap().is_some());

        let large_value = vec![0u8; 200];
        assert!(cache.set(&key(), &large_value, None).await.is_err());
    }

    #[tokio::test]
    async fn test_create_cache_respects_entry_cap() {
        let config = CacheConfig::new().with_max_entries(Some(2));
        let cache = create_cache(&config);

        for token in ["T1", "T2", "T3"] {
            let key = CacheKey::for_token(VerificationScope::Userinfo, &BearerToken::new(token));
            cache.set(&key, b"{}", None).await.unwrap();
        }

        assert_eq!(cache.stats().await.entry_count, Some(2));
    }
}
