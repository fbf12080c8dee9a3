//! Cache key types for verification results

use std::fmt::{self, Write};

use sha2::{Digest, Sha256};

use crate::auth::BearerToken;
use crate::constants::CACHE_KEY_PREFIX;

/// Which provider call produced a cached verification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationScope {
    /// Claims returned by the userinfo endpoint
    Userinfo,
    /// Claims returned by token introspection
    Introspect,
}

impl VerificationScope {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Userinfo => "userinfo",
            Self::Introspect => "introspect",
        }
    }
}

impl fmt::Display for VerificationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key derived from a scope and the SHA-256 digest of a token.
///
/// Tokens can be long and are secret, so only the hex digest is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: VerificationScope,
    digest: String,
}

impl CacheKey {
    #[must_use]
    pub fn for_token(scope: VerificationScope, token: &BearerToken) -> Self {
        Self {
            scope,
            digest: sha256_hex(token.expose().as_bytes()),
        }
    }

    #[must_use]
    pub const fn scope(&self) -> VerificationScope {
        self.scope
    }

    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Convert to string key for storage
    #[must_use]
    pub fn to_key_string(&self) -> String {
        format!("{CACHE_KEY_PREFIX}.{}.{}", self.scope.as_str(), self.digest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
