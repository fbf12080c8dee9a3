//! Prometheus metrics for oidc-bearer-auth

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::Result;
use crate::error::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

// Server metrics
const METRIC_UPTIME: &str = "oidc_bearer_auth_uptime_seconds";
const METRIC_INFO: &str = "oidc_bearer_auth_info";

// Resolution metrics
const METRIC_RESOLUTIONS: &str = "oidc_bearer_auth_resolutions_total";
const METRIC_RESOLUTION_ERRORS: &str = "oidc_bearer_auth_resolution_errors_total";

// Identity provider metrics
const METRIC_UPSTREAM_CALLS: &str = "oidc_bearer_auth_upstream_requests_total";
const METRIC_UPSTREAM_DURATION: &str = "oidc_bearer_auth_upstream_duration_seconds";

// Cache metrics
const METRIC_CACHE_HITS: &str = "oidc_bearer_auth_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "oidc_bearer_auth_cache_misses_total";

/// Initialize Prometheus metrics recorder.
pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {e}")))?;

    PROMETHEUS_HANDLE.set(handle).ok();
    START_TIME.set(Instant::now()).ok();

    register_metrics();
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_UPTIME, "Server uptime in seconds");
    describe_gauge!(METRIC_INFO, "Server information (always 1)");

    describe_counter!(METRIC_RESOLUTIONS, "Successful token resolutions by identity kind");
    describe_counter!(METRIC_RESOLUTION_ERRORS, "Failed token resolutions by error kind");

    describe_counter!(METRIC_UPSTREAM_CALLS, "Identity provider calls by endpoint and outcome");
    describe_histogram!(
        METRIC_UPSTREAM_DURATION,
        "Identity provider call duration in seconds"
    );

    describe_counter!(METRIC_CACHE_HITS, "Verification cache hits");
    describe_counter!(METRIC_CACHE_MISSES, "Verification cache misses");

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Render metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    if let Some(start) = START_TIME.get() {
        gauge!(METRIC_UPTIME).set(start.elapsed().as_secs_f64());
    }

    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record a successful resolution (`anonymous`, `user` or `client`).
pub fn record_resolution(identity: &str) {
    counter!(METRIC_RESOLUTIONS, "identity" => identity.to_owned()).increment(1);
}

/// Record a failed resolution.
pub fn record_resolution_error(error_kind: &str) {
    counter!(METRIC_RESOLUTION_ERRORS, "error_type" => error_kind.to_owned()).increment(1);
}

/// Record one identity provider call.
pub fn record_upstream_call(endpoint: &str, outcome: &str, duration: Duration) {
    counter!(
        METRIC_UPSTREAM_CALLS,
        "endpoint" => endpoint.to_owned(),
        "outcome" => outcome.to_owned(),
    )
    .increment(1);

    histogram!(METRIC_UPSTREAM_DURATION, "endpoint" => endpoint.to_owned())
        .record(duration.as_secs_f64());
}

/// Record a verification cache hit.
pub fn record_cache_hit(scope: &str) {
    counter!(METRIC_CACHE_HITS, "scope" => scope.to_owned()).increment(1);
}

/// Record a verification cache miss.
pub fn record_cache_miss(scope: &str) {
    counter!(METRIC_CACHE_MISSES, "scope" => scope.to_owned()).increment(1);
}
