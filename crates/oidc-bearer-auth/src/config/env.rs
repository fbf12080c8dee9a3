//! Environment variable loading for configuration

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::cache::CacheBackend;

/// Environment variable names
pub(crate) mod vars {
    pub const OIDC_USERINFO_ENDPOINT: &str = "OIDC_USERINFO_ENDPOINT";
    pub const OIDC_INTROSPECT_ENDPOINT: &str = "OIDC_INTROSPECT_ENDPOINT";
    pub const OIDC_INTROSPECT_CLIENT_ID: &str = "OIDC_INTROSPECT_CLIENT_ID";
    pub const OIDC_INTROSPECT_CLIENT_SECRET: &str = "OIDC_INTROSPECT_CLIENT_SECRET";
    pub const OIDC_VERIFY_SSL: &str = "OIDC_VERIFY_SSL";
    pub const OIDC_BEARER_TOKEN_REVALIDATION_TIME: &str = "OIDC_BEARER_TOKEN_REVALIDATION_TIME";
    pub const OIDC_REQUEST_TIMEOUT_SECS: &str = "OIDC_REQUEST_TIMEOUT_SECS";
    pub const OIDC_RESOLUTION_TIMEOUT_SECS: &str = "OIDC_RESOLUTION_TIMEOUT_SECS";
    pub const AUTH_CACHE_BACKEND: &str = "AUTH_CACHE_BACKEND";
    pub const AUTH_CACHE_MAX_ENTRIES: &str = "AUTH_CACHE_MAX_ENTRIES";
    pub const AUTH_HTTP_HOST: &str = "AUTH_HTTP_HOST";
    pub const AUTH_HTTP_PORT: &str = "AUTH_HTTP_PORT";
    pub const AUTH_CORS_ORIGIN: &str = "AUTH_CORS_ORIGIN";
    pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
    pub const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const AUTH_JSON_LOGS: &str = "AUTH_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Identity provider endpoints
    if let Some(url) = var(vars::OIDC_USERINFO_ENDPOINT) {
        builder = builder.userinfo_endpoint(parse_url(vars::OIDC_USERINFO_ENDPOINT, &url)?);
    }

    if let Some(url) = var(vars::OIDC_INTROSPECT_ENDPOINT) {
        builder = builder.introspect_endpoint(parse_url(vars::OIDC_INTROSPECT_ENDPOINT, &url)?);
    }

    if let Some(client_id) = var(vars::OIDC_INTROSPECT_CLIENT_ID) {
        builder = builder.introspect_client_id(client_id);
    }

    if let Some(secret) = var(vars::OIDC_INTROSPECT_CLIENT_SECRET) {
        builder = builder.introspect_client_secret(secret);
    }

    if let Some(val) = var(vars::OIDC_VERIFY_SSL) {
        builder = builder.verify_ssl(!parse_false(&val));
    }

    if let Some(value) = var(vars::OIDC_BEARER_TOKEN_REVALIDATION_TIME) {
        let ttl = parse_secs(vars::OIDC_BEARER_TOKEN_REVALIDATION_TIME, &value)?;
        builder = builder.revalidation_time(ttl);
    }

    if let Some(value) = var(vars::OIDC_REQUEST_TIMEOUT_SECS) {
        builder = builder.request_timeout(parse_secs(vars::OIDC_REQUEST_TIMEOUT_SECS, &value)?);
    }

    if let Some(value) = var(vars::OIDC_RESOLUTION_TIMEOUT_SECS) {
        let timeout = parse_secs(vars::OIDC_RESOLUTION_TIMEOUT_SECS, &value)?;
        builder = builder.resolution_timeout(Some(timeout));
    }

    // Cache
    if let Some(backend) = var(vars::AUTH_CACHE_BACKEND) {
        let backend: CacheBackend = backend.parse().unwrap_or_default();
        builder = builder.cache_backend(backend);
    }

    if let Some(max_str) = var(vars::AUTH_CACHE_MAX_ENTRIES)
        && let Ok(max) = max_str.parse::<usize>()
    {
        builder = builder.cache_max_entries(Some(max));
    }

    // Server
    if let Some(host_str) = var(vars::AUTH_HTTP_HOST)
        && let Ok(host) = host_str.parse::<IpAddr>()
    {
        builder = builder.http_host(host);
    }

    if let Some(port_str) = var(vars::AUTH_HTTP_PORT)
        && let Ok(port) = port_str.parse::<u16>()
    {
        builder = builder.http_port(port);
    }

    if let Some(origin) = var(vars::AUTH_CORS_ORIGIN) {
        builder = builder.cors_origin(Some(origin));
    }

    // Telemetry
    if let Some(endpoint) = var(vars::OTEL_EXPORTER_OTLP_ENDPOINT) {
        builder = builder.otlp_endpoint(Some(endpoint));
    }

    if let Some(name) = var(vars::OTEL_SERVICE_NAME) {
        builder = builder.service_name(name);
    }

    if let Some(level) = var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Some(val) = var(vars::AUTH_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

/// Read a variable, treating an empty value as unset
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| crate::Error::Config(format!("Invalid {name}: {e}")))
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|e| crate::Error::Config(format!("Invalid {name}: {e}")))
}

pub(crate) fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Only an explicit negative turns a default-on flag off
fn parse_false(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "false" | "0" | "no" | "off")
}
