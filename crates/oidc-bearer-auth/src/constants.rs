//! Constants shared across the authentication pipeline

use std::time::Duration;

/// Authorization scheme accepted by the token extractor (compared case-insensitively)
pub const BEARER_SCHEME: &str = "Bearer";

/// Prefix of every verification cache key
pub const CACHE_KEY_PREFIX: &str = "authentication";

/// Default revalidation time; zero disables verification caching
pub const DEFAULT_REVALIDATION_TIME: Duration = Duration::ZERO;

/// Default timeout for a single identity provider call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream response bodies are truncated to this many bytes before being kept in errors
pub const MAX_UPSTREAM_BODY_LEN: usize = 4096;

/// Service name used for tracing and the default telemetry resource
pub const SERVICE_NAME: &str = "oidc-bearer-auth";
