//! Span-per-operation wrapper around a backend

use std::time::Duration;

use async_trait::async_trait;
use tracing::{Instrument, Span};

use super::error::{CacheError, CacheResult};
use super::key::CacheKey;
use super::provider::{CacheProvider, CacheStats};

/// Wraps a [`CacheProvider`] and records each storage call as a debug span
///
/// Keys only carry the token digest, but a digest still identifies a session
/// across log lines, so nothing here is logged above debug except failures.
#[derive(Debug, Clone)]
pub struct TracedCache<C> {
    inner: C,
    service_name: String,
}

impl<C> TracedCache<C> {
    pub fn new(cache: C, service_name: impl Into<String>) -> Self {
        Self {
            inner: cache,
            service_name: service_name.into(),
        }
    }

    pub const fn inner(&self) -> &C {
        &self.inner
    }

    fn span(&self, operation: &'static str, key: &CacheKey) -> Span {
        tracing::debug_span!(
            "cache",
            otel.name = operation,
            cache.key = %key,
            cache.scope = key.scope().as_str(),
            service = %self.service_name,
        )
    }
}

fn report_failure(operation: &'static str, key: &CacheKey, err: &CacheError) {
    tracing::warn!(cache.operation = operation, cache.key = %key, error = %err);
}

#[async_trait]
impl<C: CacheProvider> CacheProvider for TracedCache<C> {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let result = self.inner.get(key).instrument(self.span("get", key)).await;

        match &result {
            Ok(Some(bytes)) => {
                tracing::debug!(
                    cache.key = %key,
                    cache.result = "hit",
                    cache.size_bytes = bytes.len(),
                );
            }
            Ok(None) => tracing::debug!(cache.key = %key, cache.result = "miss"),
            Err(e) => report_failure("get", key, e),
        }
        result
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let result = self
            .inner
            .set(key, value, ttl)
            .instrument(self.span("set", key))
            .await;

        if let Err(e) = &result {
            report_failure("set", key, e);
        }
        result
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        let result = self
            .inner
            .delete(key)
            .instrument(self.span("delete", key))
            .await;

        match &result {
            Ok(removed) => tracing::debug!(cache.key = %key, cache.removed = removed),
            Err(e) => report_failure("delete", key, e),
        }
        result
    }

    async fn stats(&self) -> CacheStats {
        self.inner.stats().await
    }
}
