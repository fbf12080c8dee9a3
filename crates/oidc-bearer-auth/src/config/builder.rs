//! Configuration builder

use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use crate::Error;
use crate::auth::OidcConfig;
use crate::cache::{CacheBackend, CacheConfig};
use crate::constants::SERVICE_NAME;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub oidc: OidcConfig,
    pub cache: CacheConfig,
    /// Upper bound for one whole resolution, fallback included
    pub resolution_timeout: Option<Duration>,
    pub transport: TransportConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn oidc(&self) -> &OidcConfig {
        &self.oidc
    }

    #[must_use]
    pub const fn cache(&self) -> &CacheConfig {
        &self.cache
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub http_host: IpAddr,
    pub http_port: u16,
    pub cors_origin: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_host: IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            http_port: 8080,
            cors_origin: None,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    oidc: OidcConfig,
    cache: CacheConfig,
    resolution_timeout: Option<Duration>,
    transport: TransportConfig,
    telemetry: TelemetryConfig,
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            oidc: OidcConfig::new(),
            cache: CacheConfig::new(),
            resolution_timeout: None,
            transport: TransportConfig {
                http_host: IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                http_port: 8080,
                cors_origin: None,
            },
            telemetry: TelemetryConfig {
                otlp_endpoint: None,
                service_name: String::new(),
                log_level: String::new(),
                json_logs: false,
            },
        }
    }

    // Identity provider configuration methods

    #[must_use]
    pub fn userinfo_endpoint(mut self, url: Url) -> Self {
        self.oidc.userinfo_endpoint = Some(url);
        self
    }

    #[must_use]
    pub fn introspect_endpoint(mut self, url: Url) -> Self {
        self.oidc.introspect_endpoint = Some(url);
        self
    }

    #[must_use]
    pub fn introspect_client_id(mut self, client_id: String) -> Self {
        self.oidc.introspect_client_id = Some(client_id);
        self
    }

    #[must_use]
    pub fn introspect_client_secret(mut self, secret: String) -> Self {
        self.oidc.introspect_client_secret = Some(secret);
        self
    }

    #[must_use]
    pub const fn verify_ssl(mut self, verify: bool) -> Self {
        self.oidc.verify_ssl = verify;
        self
    }

    /// Set how long verified tokens are reused (zero disables caching)
    #[must_use]
    pub const fn revalidation_time(mut self, ttl: Duration) -> Self {
        self.oidc.revalidation_time = ttl;
        self
    }

    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.oidc.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn resolution_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    // Cache configuration methods

    #[must_use]
    pub const fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache.backend = backend;
        self
    }

    #[must_use]
    pub const fn cache_max_entries(mut self, max: Option<usize>) -> Self {
        self.cache.max_entries = max;
        self
    }

    #[must_use]
    pub const fn cache_max_value_size(mut self, max: usize) -> Self {
        self.cache.max_value_size = max;
        self
    }

    // Server configuration methods

    #[must_use]
    pub const fn http_host(mut self, host: IpAddr) -> Self {
        self.transport.http_host = host;
        self
    }

    #[must_use]
    pub const fn http_port(mut self, port: u16) -> Self {
        self.transport.http_port = port;
        self
    }

    #[must_use]
    pub fn cors_origin(mut self, origin: Option<String>) -> Self {
        self.transport.cors_origin = origin;
        self
    }

    #[must_use]
    pub fn otlp_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.telemetry.otlp_endpoint = endpoint;
        self
    }

    #[must_use]
    pub fn service_name(mut self, name: String) -> Self {
        self.telemetry.service_name = name;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::Result<Config> {
        for (name, endpoint) in [
            ("userinfo", self.oidc.userinfo_endpoint.as_ref()),
            ("introspection", self.oidc.introspect_endpoint.as_ref()),
        ] {
            if let Some(url) = endpoint
                && !matches!(url.scheme(), "http" | "https")
            {
                return Err(Error::Config(format!(
                    "{name} endpoint must be an http(s) URL, got scheme '{}'",
                    url.scheme()
                )));
            }
        }

        if self.oidc.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be greater than zero".into()));
        }

        if self.resolution_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config(
                "resolution timeout must be greater than zero".into(),
            ));
        }

        if self.cache.max_entries == Some(0) {
            return Err(Error::Config("cache max entries must be greater than zero".into()));
        }

        if !self.oidc.has_userinfo() {
            tracing::warn!(
                "No userinfo endpoint configured: only anonymous requests can be served"
            );
        }

        if self.oidc.has_introspection() && self.oidc.introspect_client_id.is_none() {
            tracing::warn!(
                "Introspection endpoint configured without a client id: \
                 introspection fallback will fail"
            );
        }

        // Apply defaults for telemetry
        let service_name = if self.telemetry.service_name.is_empty() {
            SERVICE_NAME.to_string()
        } else {
            self.telemetry.service_name
        };

        let log_level = if self.telemetry.log_level.is_empty() {
            "info".to_string()
        } else {
            self.telemetry.log_level
        };

        Ok(Config {
            oidc: self.oidc,
            cache: self.cache,
            resolution_timeout: self.resolution_timeout,
            transport: self.transport,
            telemetry: TelemetryConfig {
                otlp_endpoint: self.telemetry.otlp_endpoint,
                service_name,
                log_level,
                json_logs: self.telemetry.json_logs,
            },
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_MAX_ENTRIES;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();

        assert!(config.oidc.userinfo_endpoint.is_none());
        assert!(config.oidc.introspect_endpoint.is_none());
        assert!(config.oidc.verify_ssl);
        assert_eq!(config.oidc.revalidation_time, Duration::ZERO);
        assert_eq!(config.oidc.request_timeout, Duration::from_secs(10));
        assert!(config.resolution_timeout.is_none());
    }

    #[test]
    fn test_builder_cache_defaults() {
        let config = ConfigBuilder::new().build().unwrap();

        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.max_entries, Some(DEFAULT_MAX_ENTRIES));
    }

    #[test]
    fn test_builder_oidc_config() {
        let config = ConfigBuilder::new()
            .userinfo_endpoint(url("https://idp.example.com/userinfo"))
            .introspect_endpoint(url("https://idp.example.com/introspect"))
            .introspect_client_id("client-1".into())
            .introspect_client_secret("s3cret".into())
            .verify_ssl(false)
            .revalidation_time(Duration::from_secs(300))
            .request_timeout(Duration::from_secs(5))
            .resolution_timeout(Some(Duration::from_secs(15)))
            .build()
            .unwrap();

        assert_eq!(
            config.oidc().userinfo_endpoint.as_ref().map(Url::as_str),
            Some("https://idp.example.com/userinfo")
        );
        assert!(config.oidc.has_introspection());
        assert_eq!(config.oidc.introspect_client_id.as_deref(), Some("client-1"));
        assert_eq!(config.oidc.introspect_client_secret.as_deref(), Some("s3cret"));
        assert!(!config.oidc.verify_ssl);
        assert!(config.oidc.caching_enabled());
        assert_eq!(config.oidc.request_timeout, Duration::from_secs(5));
        assert_eq!(config.resolution_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_builder_rejects_non_http_endpoint() {
        let err = ConfigBuilder::new()
            .userinfo_endpoint(url("ftp://idp.example.com/userinfo"))
            .build()
            .unwrap_err();

        assert!(err.is_config());
        assert!(err.to_string().contains("userinfo"));

        let err = ConfigBuilder::new()
            .introspect_endpoint(url("file:///etc/passwd"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("introspection"));
    }

    #[test]
    fn test_builder_rejects_zero_timeouts() {
        assert!(
            ConfigBuilder::new()
                .request_timeout(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            ConfigBuilder::new()
                .resolution_timeout(Some(Duration::ZERO))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_rejects_zero_cache_capacity() {
        let result = ConfigBuilder::new().cache_max_entries(Some(0)).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_cache_config() {
        let config = ConfigBuilder::new()
            .cache_backend(CacheBackend::Noop)
            .cache_max_entries(None)
            .cache_max_value_size(1024)
            .build()
            .unwrap();

        assert_eq!(config.cache().backend, CacheBackend::Noop);
        assert!(config.cache.max_entries.is_none());
        assert_eq!(config.cache.max_value_size, 1024);
    }

    #[test]
    fn test_builder_http_host_and_port() {
        let config = ConfigBuilder::new()
            .http_host(IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)))
            .http_port(9000)
            .cors_origin(Some("https://app.example.com".into()))
            .build()
            .unwrap();

        assert_eq!(
            config.transport.http_host,
            IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.transport.http_port, 9000);
        assert_eq!(
            config.transport.cors_origin.as_deref(),
            Some("https://app.example.com")
        );
    }

    #[test]
    fn test_builder_telemetry_config() {
        let config = ConfigBuilder::new()
            .otlp_endpoint(Some("http://localhost:4317".to_string()))
            .service_name("test-service".to_string())
            .log_level("debug".to_string())
            .json_logs(true)
            .build()
            .unwrap();

        assert_eq!(
            config.telemetry.otlp_endpoint,
            Some("http://localhost:4317".to_string())
        );
        assert_eq!(config.telemetry.service_name, "test-service");
        assert_eq!(config.telemetry.log_level, "debug");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_builder_telemetry_defaults() {
        let config = ConfigBuilder::new().build().unwrap();

        assert!(config.telemetry.otlp_endpoint.is_none());
        assert_eq!(config.telemetry.service_name, "oidc-bearer-auth");
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.json_logs);
    }

    #[test]
    fn test_transport_config_default() {
        let transport = TransportConfig::default();
        assert!(transport.http_host.is_loopback());
        assert_eq!(transport.http_port, 8080);
        assert!(transport.cors_origin.is_none());
    }

    #[test]
    fn test_config_debug_omits_secret() {
        let config = ConfigBuilder::new()
            .introspect_client_secret("s3cret".into())
            .build()
            .unwrap();
        let debug_str = format!("{config:?}");

        assert!(debug_str.contains("Config"));
        assert!(!debug_str.contains("s3cret"));
    }

    #[test]
    fn test_config_builder_static_method() {
        let builder = Config::builder();
        let debug_str = format!("{builder:?}");
        assert!(debug_str.contains("ConfigBuilder"));
    }
}
