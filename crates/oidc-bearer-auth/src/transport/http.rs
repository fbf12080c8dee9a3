//! HTTP server exposing the authentication pipeline

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Router, middleware};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{
    AuthState, Claims, Identity, IdentityKind, OidcConfig, TokenResolver, oidc_auth_middleware,
};
use crate::config::TransportConfig;
use crate::{Error, Result};

/// Upper bound for a whole request, provider calls included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Resolved caller as seen by a protected route
#[derive(Debug, Serialize)]
struct WhoAmIResponse<'a> {
    kind: IdentityKind,
    subject: Option<&'a str>,
    claims: Option<&'a Claims>,
}

/// Build the application router
///
/// `/health` and `/metrics` are public; every other route runs behind the
/// bearer authentication middleware.
pub fn router(resolver: Arc<TokenResolver>, config: &TransportConfig) -> Router {
    let protected = Router::new()
        .route("/whoami", get(whoami_handler))
        .route_layer(middleware::from_fn_with_state(
            AuthState::new(resolver),
            oidc_auth_middleware,
        ));

    #[allow(unused_mut)]
    let mut app = Router::new().route("/health", get(health_handler));

    #[cfg(feature = "metrics")]
    {
        app = app.route("/metrics", get(metrics_handler));
    }

    app.merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(build_cors_layer(config))
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_http(
    resolver: Arc<TokenResolver>,
    config: &TransportConfig,
    oidc: &OidcConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = SocketAddr::new(config.http_host, config.http_port);

    // Warn about security configuration
    emit_security_warnings(config, oidc);

    let app = router(resolver, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Transport(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Transport(format!("HTTP server error: {e}")))?;

    tracing::info!("HTTP server shutdown complete");
    Ok(())
}

fn build_cors_layer(config: &TransportConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match config
        .cors_origin
        .as_ref()
        .and_then(|o| o.parse::<HeaderValue>().ok())
    {
        Some(origin) => cors.allow_origin(origin),
        // No allowed origin: browsers get no cross-origin access
        None => cors,
    }
}

fn emit_security_warnings(config: &TransportConfig, oidc: &OidcConfig) {
    let host = config.http_host;
    let is_all_interfaces = host == IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        || host == IpAddr::V6(Ipv6Addr::UNSPECIFIED);

    if is_all_interfaces {
        tracing::warn!(
            "HTTP server binding to all interfaces ({host}). \
             This exposes the server to all network interfaces."
        );
    } else if !host.is_loopback() {
        tracing::warn!(
            "HTTP server binding to non-loopback address ({host}). \
             Ensure network security policies are in place."
        );
    }

    for (name, endpoint) in [
        ("userinfo", oidc.userinfo_endpoint.as_ref()),
        ("introspection", oidc.introspect_endpoint.as_ref()),
    ] {
        if let Some(url) = endpoint
            && url.scheme() == "http"
        {
            tracing::warn!(
                "SECURITY WARNING: {name} endpoint uses plain HTTP ({}). \
                 Bearer tokens are sent to the identity provider unencrypted.",
                url.as_str()
            );
        }
    }

    if !oidc.verify_ssl {
        tracing::warn!(
            "SECURITY WARNING: identity provider TLS certificates are not verified \
             (OIDC_VERIFY_SSL=false)."
        );
    }

    if config.cors_origin.is_none() {
        tracing::info!(
            "CORS origin not configured (AUTH_CORS_ORIGIN). Cross-origin requests are refused"
        );
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn whoami_handler(identity: Identity) -> impl IntoResponse {
    let body = serde_json::to_value(WhoAmIResponse {
        kind: identity.kind(),
        subject: identity.subject(),
        claims: identity.claims(),
    });

    match body {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize identity");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(feature = "metrics")]
async fn metrics_handler() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        crate::observability::render_metrics(),
    )
}
