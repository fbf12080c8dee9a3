//! TOML configuration file loading

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::cache::CacheBackend;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./oidc-bearer-auth.toml",
    "~/.config/oidc-bearer-auth/config.toml",
    "/etc/oidc-bearer-auth/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    builder = apply_file_config(builder, file_config)?;
    Ok(builder)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    // Identity provider settings
    if let Some(oidc) = config.oidc {
        if let Some(url_str) = oidc.userinfo_endpoint {
            let url = Url::parse(&url_str)
                .map_err(|e| crate::Error::Config(format!("Invalid userinfo endpoint: {e}")))?;
            builder = builder.userinfo_endpoint(url);
        }

        if let Some(url_str) = oidc.introspect_endpoint {
            let url = Url::parse(&url_str).map_err(|e| {
                crate::Error::Config(format!("Invalid introspection endpoint: {e}"))
            })?;
            builder = builder.introspect_endpoint(url);
        }

        if let Some(client_id) = oidc.introspect_client_id {
            builder = builder.introspect_client_id(client_id);
        }

        if let Some(secret) = oidc.introspect_client_secret {
            builder = builder.introspect_client_secret(secret);
        }

        if let Some(verify) = oidc.verify_ssl {
            builder = builder.verify_ssl(verify);
        }

        if let Some(secs) = oidc.revalidation_time_secs {
            builder = builder.revalidation_time(Duration::from_secs(secs));
        }

        if let Some(secs) = oidc.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        if let Some(secs) = oidc.resolution_timeout_secs {
            builder = builder.resolution_timeout(Some(Duration::from_secs(secs)));
        }
    }

    // Cache settings
    if let Some(cache) = config.cache {
        if let Some(backend_str) = cache.backend {
            let backend: CacheBackend = backend_str.parse().unwrap_or_default();
            builder = builder.cache_backend(backend);
        }

        if let Some(max) = cache.max_entries {
            builder = builder.cache_max_entries(Some(max));
        }

        if let Some(max) = cache.max_value_size {
            builder = builder.cache_max_value_size(max);
        }
    }

    // Server settings
    if let Some(server) = config.server {
        if let Some(host_str) = server.http_host
            && let Ok(host) = host_str.parse::<IpAddr>()
        {
            builder = builder.http_host(host);
        }

        if let Some(port) = server.http_port {
            builder = builder.http_port(port);
        }

        if let Some(origin) = server.cors_origin {
            builder = builder.cors_origin(Some(origin));
        }
    }

    // Observability settings
    if let Some(obs) = config.observability {
        if let Some(endpoint) = obs.otlp_endpoint {
            builder = builder.otlp_endpoint(Some(endpoint));
        }

        if let Some(name) = obs.service_name {
            builder = builder.service_name(name);
        }

        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    oidc: Option<OidcFileConfig>,
    cache: Option<CacheFileConfig>,
    server: Option<ServerFileConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Deserialize)]
struct OidcFileConfig {
    userinfo_endpoint: Option<String>,
    introspect_endpoint: Option<String>,
    introspect_client_id: Option<String>,
    introspect_client_secret: Option<String>,
    verify_ssl: Option<bool>,
    revalidation_time_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    resolution_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CacheFileConfig {
    backend: Option<String>,
    max_entries: Option<usize>,
    max_value_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ServerFileConfig {
    http_host: Option<String>,
    http_port: Option<u16>,
    cors_origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    otlp_endpoint: Option<String>,
    service_name: Option<String>,
    log_level: Option<String>,
    json_logs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[oidc]
userinfo_endpoint = "https://idp.example.com/userinfo"
introspect_endpoint = "https://idp.example.com/introspect"
introspect_client_id = "client-1"
introspect_client_secret = "s3cret"
verify_ssl = true
revalidation_time_secs = 300
request_timeout_secs = 5
resolution_timeout_secs = 12

[cache]
backend = "memory"
max_entries = 2000
max_value_size = 8192

[server]
http_host = "0.0.0.0"
http_port = 9090
cors_origin = "https://app.example.com"

[observability]
otlp_endpoint = "http://localhost:4317"
service_name = "edge-auth"
log_level = "debug"
json_logs = true
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();

        assert!(config.oidc.is_some());
        assert!(config.cache.is_some());
        assert!(config.server.is_some());
        assert!(config.observability.is_some());

        let oidc = config.oidc.unwrap();
        assert_eq!(
            oidc.userinfo_endpoint,
            Some("https://idp.example.com/userinfo".to_string())
        );
        assert_eq!(oidc.revalidation_time_secs, Some(300));

        let cache = config.cache.unwrap();
        assert_eq!(cache.max_entries, Some(2000));
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_content = r#"
[oidc]
userinfo_endpoint = "https://idp.example.com/userinfo"
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();
        assert!(config.oidc.is_some());
        assert!(config.cache.is_none());
        assert!(config.server.is_none());
    }

    #[test]
    fn test_load_from_file_success() {
        let toml_content = r#"
[oidc]
userinfo_endpoint = "https://idp.example.com/userinfo"
introspect_endpoint = "https://idp.example.com/introspect"
introspect_client_id = "client-1"
verify_ssl = false
revalidation_time_secs = 60

[cache]
backend = "noop"
"#;
        let temp_file = create_temp_config(toml_content);

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(
            config.oidc.userinfo_endpoint.as_ref().map(Url::as_str),
            Some("https://idp.example.com/userinfo")
        );
        assert!(config.oidc.has_introspection());
        assert_eq!(config.oidc.introspect_client_id.as_deref(), Some("client-1"));
        assert!(!config.oidc.verify_ssl);
        assert_eq!(config.oidc.revalidation_time, Duration::from_secs(60));
        assert_eq!(config.cache.backend, CacheBackend::Noop);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(
            Path::new("/nonexistent/path/config.toml"),
            ConfigBuilder::new(),
        );
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let temp_file = create_temp_config("this is not valid toml {{{{");

        let result = load_from_file(temp_file.path(), ConfigBuilder::new());
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_from_file_invalid_url() {
        let toml_content = r#"
[oidc]
introspect_endpoint = "not a valid url"
"#;
        let temp_file = create_temp_config(toml_content);

        let result = load_from_file(temp_file.path(), ConfigBuilder::new());
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid introspection endpoint"));
    }

    #[test]
    fn test_load_server_config() {
        let toml_content = r#"
[server]
http_host = "192.168.1.1"
http_port = 8888
cors_origin = "https://app.example.com"
"#;
        let temp_file = create_temp_config(toml_content);

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(
            config.transport.http_host,
            "192.168.1.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(config.transport.http_port, 8888);
        assert_eq!(
            config.transport.cors_origin.as_deref(),
            Some("https://app.example.com")
        );
    }

    #[test]
    fn test_load_invalid_http_host_ignored() {
        let toml_content = r#"
[server]
http_host = "not_an_ip"
"#;
        let temp_file = create_temp_config(toml_content);

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(
            config.transport.http_host,
            "127.0.0.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_load_observability_config() {
        let toml_content = r#"
[observability]
otlp_endpoint = "http://jaeger:4317"
service_name = "my-service"
log_level = "trace"
json_logs = true
"#;
        let temp_file = create_temp_config(toml_content);

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(
            config.telemetry.otlp_endpoint,
            Some("http://jaeger:4317".to_string())
        );
        assert_eq!(config.telemetry.service_name, "my-service");
        assert_eq!(config.telemetry.log_level, "trace");
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_load_timeouts() {
        let toml_content = r#"
[oidc]
request_timeout_secs = 3
resolution_timeout_secs = 7
"#;
        let temp_file = create_temp_config(toml_content);

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(config.oidc.request_timeout, Duration::from_secs(3));
        assert_eq!(config.resolution_timeout, Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_empty_config_file() {
        let temp_file = create_temp_config("");

        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        let config = builder.build().unwrap();
        assert!(!config.oidc.has_userinfo());
        assert!(config.oidc.verify_ssl);
    }

    #[test]
    fn test_find_config_file_not_found() {
        let result = find_config_file();
        assert!(result.is_none() || result.unwrap().exists());
    }
}
