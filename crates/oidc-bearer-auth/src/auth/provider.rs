//! Identity provider trait definition

use async_trait::async_trait;

use super::error::Result;
use super::identity::{BearerToken, Claims};

/// Remote token verification capability.
///
/// Implementations perform exactly one upstream call per invocation and never
/// retry; retry policy belongs to the caller.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the token through the userinfo endpoint
    async fn fetch_userinfo(&self, token: &BearerToken) -> Result<Claims>;

    /// Resolve the token through the introspection endpoint
    async fn fetch_introspection(&self, token: &BearerToken) -> Result<Claims>;

    /// Whether a userinfo endpoint is configured
    fn has_userinfo(&self) -> bool;

    /// Whether an introspection endpoint is configured
    fn has_introspection(&self) -> bool;
}
