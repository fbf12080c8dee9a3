//! Bearer tokens and resolved identities

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Claims returned by the identity provider (a JSON object)
pub type Claims = serde_json::Map<String, Value>;

/// Opaque bearer credential taken from the `Authorization` header.
///
/// `Debug` never prints the value; use [`BearerToken::expose`] where the raw
/// token must leave the process (outbound provider calls).
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Identity resolved through the userinfo endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedUser {
    pub token: BearerToken,
    pub claims: Claims,
}

/// Identity resolved through token introspection
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClient {
    pub token: BearerToken,
    pub claims: Claims,
}

/// Outcome of bearer token resolution, attached to every authenticated request
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// No `Authorization` header was presented
    Anonymous,
    /// Token accepted by the userinfo endpoint
    User(VerifiedUser),
    /// Token rejected by userinfo but accepted by introspection
    Client(VerifiedClient),
}

/// Variant tag of an [`Identity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Anonymous,
    User,
    Client,
}

impl IdentityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::User => "user",
            Self::Client => "client",
        }
    }
}

impl Identity {
    #[must_use]
    pub fn user(token: BearerToken, claims: Claims) -> Self {
        Self::User(VerifiedUser { token, claims })
    }

    #[must_use]
    pub fn client(token: BearerToken, claims: Claims) -> Self {
        Self::Client(VerifiedClient { token, claims })
    }

    #[must_use]
    pub const fn kind(&self) -> IdentityKind {
        match self {
            Self::Anonymous => IdentityKind::Anonymous,
            Self::User(_) => IdentityKind::User,
            Self::Client(_) => IdentityKind::Client,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(&user.claims),
            Self::Client(client) => Some(&client.claims),
        }
    }

    #[must_use]
    pub const fn token(&self) -> Option<&BearerToken> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(&user.token),
            Self::Client(client) => Some(&client.token),
        }
    }

    /// `sub` for users; `client_id` (falling back to `sub`) for clients
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => claim_str(&user.claims, "sub"),
            Self::Client(client) => {
                claim_str(&client.claims, "client_id").or_else(|| claim_str(&client.claims, "sub"))
            }
        }
    }
}

fn claim_str<'a>(claims: &'a Claims, name: &str) -> Option<&'a str> {
    claims.get(name).and_then(Value::as_str)
}
