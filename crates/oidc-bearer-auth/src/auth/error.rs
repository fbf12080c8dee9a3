//! Authentication error types

use std::sync::Arc;

use thiserror::Error;

/// Why a bearer token could not be resolved
///
/// Cheap to clone, so callers sharing one provider call can each receive
/// the same failure.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("invalid Authorization header: {0}")]
    MalformedAuthHeader(String),

    #[error("identity provider misconfigured: {0}")]
    MisconfiguredProvider(String),

    #[error("identity provider returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("identity provider request failed: {0}")]
    Network(Arc<reqwest::Error>),

    #[error("identity provider request timed out")]
    Timeout,

    #[error("invalid identity provider response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedAuthHeader(msg.into())
    }

    pub(crate) fn misconfigured(msg: impl Into<String>) -> Self {
        Self::MisconfiguredProvider(msg.into())
    }

    /// Status code of an upstream rejection, if this is one
    #[must_use]
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401/403 from userinfo means "not a userinfo token", not a hard failure
    #[must_use]
    pub const fn allows_introspection_fallback(&self) -> bool {
        matches!(self.upstream_status(), Some(401 | 403))
    }

    /// Errors an operator has to fix; everything else is the caller's credential
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(self, Self::MisconfiguredProvider(_))
    }

    /// Short stable label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedAuthHeader(_) => "malformed_header",
            Self::MisconfiguredProvider(_) => "misconfigured",
            Self::Upstream { .. } => "upstream",
            Self::Network(_) => "network",
            Self::Timeout => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(Arc::new(err))
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
