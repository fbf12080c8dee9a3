//! Bearer token authentication against an OIDC identity provider
//!
//! Tokens are verified by calling the provider's userinfo endpoint, with an
//! optional fallback to token introspection for client credentials. Successful
//! verifications are cached for a configurable revalidation time.

pub mod auth;
pub mod cache;
pub mod config;
mod constants;
mod error;
pub mod observability;
pub mod transport;

pub use auth::{
    AuthError, BearerToken, Claims, Identity, IdentityKind, IdentityProvider, OidcConfig,
    OidcProviderClient, TokenResolver, extract_bearer_token,
};
pub use cache::{
    CacheBackend, CacheConfig, CacheError, CacheKey, CacheProvider, CacheResult, CacheStats,
    InMemoryCache, NoopCache, TracedCache, VerificationCache, VerificationScope, create_cache,
};
pub use config::{Config, ConfigBuilder, TelemetryConfig, TransportConfig};
pub use error::{Error, Result};
