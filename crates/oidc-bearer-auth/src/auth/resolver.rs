//! Bearer token resolution: extraction, cached verification, fallback

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::error::{AuthError, Result};
use super::extractor::extract_bearer_token;
use super::identity::{BearerToken, Identity, VerifiedClient, VerifiedUser};
use super::provider::IdentityProvider;
use crate::cache::{VerificationCache, VerificationScope};

/// Turns an `Authorization` header into an [`Identity`]
///
/// The userinfo endpoint is tried first. A 401 or 403 from it sends the
/// token to introspection, when introspection is configured. Both answers
/// are memoized for `ttl`; a zero `ttl` disables memoization.
pub struct TokenResolver {
    provider: Arc<dyn IdentityProvider>,
    cache: VerificationCache,
    ttl: Duration,
    resolution_timeout: Option<Duration>,
}

impl std::fmt::Debug for TokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResolver")
            .field("has_userinfo", &self.provider.has_userinfo())
            .field("has_introspection", &self.provider.has_introspection())
            .field("ttl", &self.ttl)
            .field("resolution_timeout", &self.resolution_timeout)
            .finish_non_exhaustive()
    }
}

impl TokenResolver {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        cache: VerificationCache,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            ttl,
            resolution_timeout: None,
        }
    }

    /// Bound the whole resolution, fallback included
    #[must_use]
    pub const fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn cache(&self) -> &VerificationCache {
        &self.cache
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve the raw `Authorization` header value
    pub async fn resolve(&self, authorization: Option<&[u8]>) -> Result<Identity> {
        let span = tracing::debug_span!(
            "auth.resolve",
            otel.name = "auth.resolve",
            auth.identity = tracing::field::Empty,
            auth.error = tracing::field::Empty,
        );

        let result = self.resolve_bounded(authorization).instrument(span.clone()).await;

        match &result {
            Ok(identity) => {
                span.record("auth.identity", identity.kind().as_str());
                tracing::debug!(
                    parent: &span,
                    identity = identity.kind().as_str(),
                    "Request authenticated"
                );
            }
            Err(e) if e.is_operational() => {
                span.record("auth.error", e.kind());
                tracing::error!(parent: &span, error = %e, "Token resolution misconfigured");
            }
            Err(e) => {
                span.record("auth.error", e.kind());
                tracing::info!(parent: &span, error = %e, "Token rejected");
            }
        }

        record_outcome(&result);
        result
    }

    async fn resolve_bounded(&self, authorization: Option<&[u8]>) -> Result<Identity> {
        let Some(token) = extract_bearer_token(authorization)? else {
            return Ok(Identity::Anonymous);
        };

        match self.resolution_timeout {
            Some(limit) => tokio::time::timeout(limit, self.verify(token))
                .await
                .map_err(|_| AuthError::Timeout)?,
            None => self.verify(token).await,
        }
    }

    async fn verify(&self, token: BearerToken) -> Result<Identity> {
        if !self.provider.has_userinfo() {
            return Err(AuthError::misconfigured("userinfo endpoint is not configured"));
        }

        let provider = &self.provider;
        let userinfo = self
            .cache
            .get_or_compute(VerificationScope::Userinfo, &token, self.ttl, || {
                provider.fetch_userinfo(&token)
            })
            .await;

        match userinfo {
            Ok(claims) => Ok(Identity::User(VerifiedUser { token, claims })),
            Err(e) if e.allows_introspection_fallback() && provider.has_introspection() => {
                tracing::debug!(
                    status = e.upstream_status(),
                    "Userinfo rejected token, trying introspection"
                );
                let claims = self
                    .cache
                    .get_or_compute(VerificationScope::Introspect, &token, self.ttl, || {
                        provider.fetch_introspection(&token)
                    })
                    .await?;
                Ok(Identity::Client(VerifiedClient { token, claims }))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(feature = "metrics")]
fn record_outcome(result: &Result<Identity>) {
    match result {
        Ok(identity) => crate::observability::record_resolution(identity.kind().as_str()),
        Err(e) => crate::observability::record_resolution_error(e.kind()),
    }
}

#[cfg(not(feature = "metrics"))]
const fn record_outcome(_result: &Result<Identity>) {}
