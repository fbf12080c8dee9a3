//! Identity provider configuration

use std::time::Duration;

use url::Url;

use crate::constants::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_REVALIDATION_TIME};

/// OIDC identity provider settings
#[derive(Clone)]
pub struct OidcConfig {
    /// Userinfo endpoint; required as soon as a token is presented
    pub userinfo_endpoint: Option<Url>,
    /// Token introspection endpoint; enables the client fallback when set
    pub introspect_endpoint: Option<Url>,
    /// Client id used for HTTP Basic authentication against introspection
    pub introspect_client_id: Option<String>,
    /// Client secret used for HTTP Basic authentication against introspection
    pub introspect_client_secret: Option<String>,
    /// Verify provider TLS certificates. Disable only outside production:
    /// tokens and client credentials become open to interception.
    pub verify_ssl: bool,
    /// How long a successful verification is reused; zero disables caching
    pub revalidation_time: Duration,
    /// Timeout for a single provider call
    pub request_timeout: Duration,
}

// Custom Debug impl that omits the client secret
impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("userinfo_endpoint", &self.userinfo_endpoint)
            .field("introspect_endpoint", &self.introspect_endpoint)
            .field("introspect_client_id", &self.introspect_client_id)
            .field("verify_ssl", &self.verify_ssl)
            .field("revalidation_time", &self.revalidation_time)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl OidcConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            userinfo_endpoint: None,
            introspect_endpoint: None,
            introspect_client_id: None,
            introspect_client_secret: None,
            verify_ssl: true,
            revalidation_time: DEFAULT_REVALIDATION_TIME,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_userinfo_endpoint(mut self, url: Url) -> Self {
        self.userinfo_endpoint = Some(url);
        self
    }

    #[must_use]
    pub fn with_introspect_endpoint(mut self, url: Url) -> Self {
        self.introspect_endpoint = Some(url);
        self
    }

    #[must_use]
    pub fn with_introspect_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.introspect_client_id = Some(client_id.into());
        self.introspect_client_secret = Some(client_secret.into());
        self
    }

    #[must_use]
    pub const fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    #[must_use]
    pub const fn with_revalidation_time(mut self, ttl: Duration) -> Self {
        self.revalidation_time = ttl;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn has_userinfo(&self) -> bool {
        self.userinfo_endpoint.is_some()
    }

    #[must_use]
    pub const fn has_introspection(&self) -> bool {
        self.introspect_endpoint.is_some()
    }

    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        !self.revalidation_time.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oidc_config_default() {
        let config = OidcConfig::default();
        assert!(!config.has_userinfo());
        assert!(!config.has_introspection());
        assert!(config.verify_ssl);
        assert!(!config.caching_enabled());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_oidc_config_builder() {
        let config = OidcConfig::new()
            .with_userinfo_endpoint(Url::parse("https://idp.example.com/userinfo").unwrap())
            .with_introspect_endpoint(Url::parse("https://idp.example.com/introspect").unwrap())
            .with_introspect_credentials("client", "secret")
            .with_verify_ssl(false)
            .with_revalidation_time(Duration::from_secs(60))
            .with_request_timeout(Duration::from_secs(3));

        assert!(config.has_userinfo());
        assert!(config.has_introspection());
        assert_eq!(config.introspect_client_id.as_deref(), Some("client"));
        assert!(!config.verify_ssl);
        assert!(config.caching_enabled());
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_oidc_config_debug_redacts_secret() {
        let config = OidcConfig::new().with_introspect_credentials("client", "super_secret_value");
        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super_secret_value"));
        assert!(debug_str.contains("client"));
    }
}
