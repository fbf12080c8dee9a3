//! Bearer token authentication against an OIDC provider
//!
//! A request's `Authorization: Bearer <token>` header is resolved into an
//! [`Identity`]:
//!
//! - no header: [`Identity::Anonymous`]
//! - token accepted by the userinfo endpoint: [`Identity::User`]
//! - token rejected by userinfo with 401/403 but accepted by token
//!   introspection: [`Identity::Client`]
//!
//! # Components
//!
//! - [`extract_bearer_token`] parses the header without any I/O
//! - [`IdentityProvider`] is the remote verification seam, implemented over
//!   HTTP by [`OidcProviderClient`]
//! - [`TokenResolver`] sequences extraction, cached verification and fallback
//! - `oidc_auth_middleware` (feature `http`) attaches the result to axum
//!   requests; handlers take it with the [`Identity`] extractor
//!
//! # Token Handling
//!
//! [`BearerToken`] never prints its value. Verification results are cached
//! under a SHA-256 digest of the token, so the plaintext never reaches a
//! cache backend or a log line.

mod client;
mod config;
mod error;
mod extractor;
mod identity;
#[cfg(feature = "http")]
mod middleware;
mod provider;
mod resolver;

pub use client::OidcProviderClient;
pub use config::OidcConfig;
pub use error::{AuthError, Result};
pub use extractor::extract_bearer_token;
pub use identity::{BearerToken, Claims, Identity, IdentityKind, VerifiedClient, VerifiedUser};
#[cfg(feature = "http")]
pub use middleware::{AuthState, oidc_auth_middleware};
pub use provider::IdentityProvider;
pub use resolver::TokenResolver;
