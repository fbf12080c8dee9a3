//! Memoization of provider verification results

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::key::{CacheKey, VerificationScope};
use super::provider::{CacheProvider, CacheStats};
use crate::auth::{BearerToken, Claims, Result};

/// Outcome of an in-flight computation; `None` until the leader finishes
type Outcome = Option<Result<Claims>>;

/// Verification result cache keyed by `(scope, sha256(token))`
///
/// Concurrent misses for the same key are collapsed: one caller (the leader)
/// computes and every caller that arrived meanwhile receives the leader's
/// outcome, failures included. Backend failures never fail a resolution;
/// they degrade to a miss.
pub struct VerificationCache {
    store: Arc<dyn CacheProvider>,
    inflight: Mutex<HashMap<CacheKey, watch::Receiver<Outcome>>>,
}

impl std::fmt::Debug for VerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCache")
            .field("inflight", &self.inflight.lock().len())
            .finish_non_exhaustive()
    }
}

/// Role of a caller that missed the cache
enum Flight {
    Leader(watch::Sender<Outcome>),
    Follower(watch::Receiver<Outcome>),
}

impl VerificationCache {
    #[must_use]
    pub fn new(store: Arc<dyn CacheProvider>) -> Self {
        Self {
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheProvider> {
        &self.store
    }

    /// Return cached claims for `token` or run `compute` and cache its result.
    ///
    /// A zero `ttl` bypasses the cache entirely. Errors from `compute` are
    /// handed to the callers already waiting on it but never stored. If the
    /// leader's future is dropped before `compute` finishes, nothing is
    /// written and one of the waiters computes instead.
    pub async fn get_or_compute<F, Fut>(
        &self,
        scope: VerificationScope,
        token: &BearerToken,
        ttl: Duration,
        compute: F,
    ) -> Result<Claims>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Claims>> + Send,
    {
        if ttl.is_zero() {
            return compute().await;
        }

        let key = CacheKey::for_token(scope, token);

        loop {
            if let Some(claims) = self.lookup(&key).await {
                record_hit(scope);
                return Ok(claims);
            }

            match self.join_flight(&key) {
                Flight::Leader(outcome) => {
                    let _leader = LeaderGuard {
                        owner: self,
                        key: &key,
                    };
                    record_miss(scope);

                    let result = compute().await;
                    if let Ok(claims) = &result {
                        self.save(&key, claims, ttl).await;
                    }
                    outcome.send_replace(Some(result.clone()));
                    return result;
                }
                Flight::Follower(mut outcome) => {
                    let shared = match outcome.wait_for(Option::is_some).await {
                        Ok(done) => done.clone(),
                        // Leader dropped without an outcome
                        Err(_) => None,
                    };
                    if let Some(result) = shared {
                        return result;
                    }
                }
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }

    fn join_flight(&self, key: &CacheKey) -> Flight {
        let mut inflight = self.inflight.lock();
        if let Some(outcome) = inflight.get(key) {
            return Flight::Follower(outcome.clone());
        }

        let (sender, receiver) = watch::channel(None);
        inflight.insert(key.clone(), receiver);
        Flight::Leader(sender)
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Claims> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    cache.key = %key,
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                return None;
            }
        };

        match serde_json::from_slice::<Claims>(&bytes) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::warn!(
                    cache.key = %key,
                    error = %e,
                    "Discarding undecodable cache entry"
                );
                if let Err(e) = self.store.delete(key).await {
                    tracing::warn!(
                        cache.key = %key,
                        error = %e,
                        "Failed to delete undecodable cache entry"
                    );
                }
                None
            }
        }
    }

    async fn save(&self, key: &CacheKey, claims: &Claims, ttl: Duration) {
        let bytes = match serde_json::to_vec(claims) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(cache.key = %key, error = %e, "Failed to serialize claims");
                return;
            }
        };

        if let Err(e) = self.store.set(key, &bytes, Some(ttl)).await {
            tracing::warn!(cache.key = %key, error = %e, "Cache write failed");
        }
    }
}

/// Clears the in-flight entry when the leader finishes or is dropped
struct LeaderGuard<'a> {
    owner: &'a VerificationCache,
    key: &'a CacheKey,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        self.owner.inflight.lock().remove(self.key);
    }
}

#[cfg(feature = "metrics")]
fn record_hit(scope: VerificationScope) {
    crate::observability::record_cache_hit(scope.as_str());
}

#[cfg(not(feature = "metrics"))]
const fn record_hit(_scope: VerificationScope) {}

#[cfg(feature = "metrics")]
fn record_miss(scope: VerificationScope) {
    crate::observability::record_cache_miss(scope.as_str());
}

#[cfg(not(feature = "metrics"))]
const fn record_miss(_scope: VerificationScope) {}
