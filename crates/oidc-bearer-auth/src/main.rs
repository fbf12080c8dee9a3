use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use oidc_bearer_auth::config::{self, ConfigBuilder};
use oidc_bearer_auth::observability::{init_observability, shutdown_observability};
use oidc_bearer_auth::transport::run_http;
use oidc_bearer_auth::{
    CacheBackend, OidcProviderClient, TokenResolver, VerificationCache, create_cache,
};
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "oidc-bearer-auth")]
#[command(
    about = "Bearer token authentication against an OIDC provider",
    long_about = None
)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OIDC userinfo endpoint
    #[arg(long)]
    userinfo_endpoint: Option<Url>,

    /// OIDC token introspection endpoint
    #[arg(long)]
    introspect_endpoint: Option<Url>,

    /// Client id for the introspection endpoint
    #[arg(long)]
    introspect_client_id: Option<String>,

    /// Seconds a successful verification is reused (0 disables caching)
    #[arg(long)]
    revalidation_time: Option<u64>,

    /// Upper bound in seconds for one whole token resolution
    #[arg(long)]
    resolution_timeout: Option<u64>,

    /// Skip TLS certificate verification of the identity provider
    #[arg(long)]
    insecure_skip_verify: bool,

    /// Verification cache backend (memory or noop)
    #[arg(long)]
    cache_backend: Option<String>,

    /// HTTP bind host
    #[arg(long, default_value = "127.0.0.1")]
    http_host: IpAddr,

    /// HTTP bind port
    #[arg(long, default_value = "8080")]
    http_port: u16,

    /// Allowed CORS origin
    #[arg(long)]
    cors_origin: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// CLI values form the base layer; file and environment override them
    fn into_builder(self) -> ConfigBuilder {
        let mut builder = ConfigBuilder::new()
            .http_host(self.http_host)
            .http_port(self.http_port)
            .cors_origin(self.cors_origin)
            .json_logs(self.json_logs);

        if let Some(url) = self.userinfo_endpoint {
            builder = builder.userinfo_endpoint(url);
        }
        if let Some(url) = self.introspect_endpoint {
            builder = builder.introspect_endpoint(url);
        }
        if let Some(client_id) = self.introspect_client_id {
            builder = builder.introspect_client_id(client_id);
        }
        if let Some(secs) = self.revalidation_time {
            builder = builder.revalidation_time(Duration::from_secs(secs));
        }
        if let Some(secs) = self.resolution_timeout {
            builder = builder.resolution_timeout(Some(Duration::from_secs(secs)));
        }
        if self.insecure_skip_verify {
            builder = builder.verify_ssl(false);
        }
        if let Some(backend) = self.cache_backend.as_deref() {
            let backend: CacheBackend = backend.parse().unwrap_or_default();
            builder = builder.cache_backend(backend);
        }
        if self.verbose {
            builder = builder.log_level("debug".to_string());
        }

        builder
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();
    let config_path = args.config.take();
    let builder = args.into_builder();

    // Load configuration with precedence: env > file > CLI > defaults
    let builder = match config_path {
        Some(ref path) => config::load_config_from_path(path, builder)?,
        None => config::load_config(builder)?,
    };

    let config = builder.build()?;

    // Initialize observability
    init_observability(&config.telemetry)?;

    let cache = VerificationCache::new(create_cache(config.cache()));
    let provider = OidcProviderClient::new(config.oidc.clone())?;

    let mut resolver = TokenResolver::new(
        Arc::new(provider),
        cache,
        config.oidc.revalidation_time,
    );
    if let Some(timeout) = config.resolution_timeout {
        resolver = resolver.with_resolution_timeout(timeout);
    }

    // Log startup info
    tracing::info!("Starting oidc-bearer-auth");
    tracing::info!(
        "Userinfo endpoint: {}",
        config
            .oidc
            .userinfo_endpoint
            .as_ref()
            .map_or("<not configured>", Url::as_str)
    );
    tracing::info!(
        "Introspection fallback: {}",
        config.oidc.introspect_endpoint.is_some()
    );
    tracing::info!("Revalidation time: {:?}", config.oidc.revalidation_time);
    tracing::info!("Cache backend: {:?}", config.cache.backend);
    tracing::info!("Resolution timeout: {:?}", config.resolution_timeout);

    // Setup shutdown signal
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                signal_cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to install Ctrl+C handler: {e}"),
        }
    });

    let result = run_http(
        Arc::new(resolver),
        &config.transport,
        &config.oidc,
        cancel.cancelled_owned(),
    )
    .await;

    // Shutdown observability
    shutdown_observability();

    result.map_err(Into::into)
}
