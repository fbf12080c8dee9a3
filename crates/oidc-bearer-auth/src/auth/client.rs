//! HTTP client for the OIDC userinfo and introspection endpoints

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::Instrument;
use url::Url;

use super::config::OidcConfig;
use super::error::{AuthError, Result};
use super::identity::{BearerToken, Claims};
use super::provider::IdentityProvider;
use crate::constants::MAX_UPSTREAM_BODY_LEN;

/// Identity provider backed by a shared `reqwest::Client`
pub struct OidcProviderClient {
    http: reqwest::Client,
    config: OidcConfig,
}

impl std::fmt::Debug for OidcProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcProviderClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OidcProviderClient {
    pub fn new(config: OidcConfig) -> Result<Self> {
        if !config.verify_ssl {
            tracing::warn!(
                "OIDC_VERIFY_SSL is disabled: identity provider certificates are not verified. \
                 Tokens and client credentials can be intercepted; never use this in production."
            );
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| AuthError::misconfigured(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    #[must_use]
    pub const fn config(&self) -> &OidcConfig {
        &self.config
    }

    fn endpoint<'a>(endpoint: Option<&'a Url>, name: &str) -> Result<&'a Url> {
        endpoint.ok_or_else(|| AuthError::misconfigured(format!("{name} endpoint is not set")))
    }
}

#[async_trait]
impl IdentityProvider for OidcProviderClient {
    async fn fetch_userinfo(&self, token: &BearerToken) -> Result<Claims> {
        let url = Self::endpoint(self.config.userinfo_endpoint.as_ref(), "userinfo")?;

        let request = self
            .http
            .get(url.clone())
            .bearer_auth(token.expose())
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        send("userinfo", request).await
    }

    async fn fetch_introspection(&self, token: &BearerToken) -> Result<Claims> {
        let url = Self::endpoint(self.config.introspect_endpoint.as_ref(), "introspection")?;
        let client_id = self.config.introspect_client_id.as_deref().ok_or_else(|| {
            AuthError::misconfigured("introspection client id is not set")
        })?;

        // form() sets Content-Type: application/x-www-form-urlencoded
        let request = self
            .http
            .post(url.clone())
            .basic_auth(client_id, self.config.introspect_client_secret.as_deref())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .form(&[("token", token.expose())]);

        send("introspect", request).await
    }

    fn has_userinfo(&self) -> bool {
        self.config.has_userinfo()
    }

    fn has_introspection(&self) -> bool {
        self.config.has_introspection()
    }
}

async fn send(endpoint: &'static str, request: reqwest::RequestBuilder) -> Result<Claims> {
    let span = tracing::debug_span!(
        "oidc.request",
        otel.name = %format_args!("oidc.{endpoint}"),
        oidc.endpoint = endpoint,
    );
    let started = Instant::now();
    let result = execute(request).instrument(span).await;
    let elapsed = started.elapsed();

    match &result {
        Ok(_) => {
            tracing::debug!(
                oidc.endpoint = endpoint,
                elapsed = ?elapsed,
                "identity provider accepted token"
            );
        }
        Err(AuthError::Upstream { status, .. }) => {
            tracing::debug!(
                oidc.endpoint = endpoint,
                oidc.status = *status,
                elapsed = ?elapsed,
                "identity provider rejected token"
            );
        }
        Err(e) => {
            tracing::warn!(
                oidc.endpoint = endpoint,
                error = %e,
                elapsed = ?elapsed,
                "identity provider call failed"
            );
        }
    }

    #[cfg(feature = "metrics")]
    crate::observability::record_upstream_call(
        endpoint,
        match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        },
        elapsed,
    );

    result
}

async fn execute(request: reqwest::RequestBuilder) -> Result<Claims> {
    let mut response = request.send().await?;
    let status = response.status();

    // A rejection keeps its status even when the body cannot be read
    if !status.is_success() {
        let body = read_rejection_body(&mut response).await.unwrap_or_else(|e| {
            tracing::debug!(oidc.status = status.as_u16(), error = %e, "Rejection body unreadable");
            String::new()
        });
        return Err(AuthError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.bytes().await?;
    match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(other) => Err(AuthError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(AuthError::InvalidResponse(format!("malformed JSON: {e}"))),
    }
}

/// Read at most `MAX_UPSTREAM_BODY_LEN` bytes of an error response
async fn read_rejection_body(response: &mut reqwest::Response) -> reqwest::Result<String> {
    let mut buf = Vec::new();
    while buf.len() < MAX_UPSTREAM_BODY_LEN {
        match response.chunk().await? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    buf.truncate(MAX_UPSTREAM_BODY_LEN);
    Ok(truncate_body(String::from_utf8_lossy(&buf).into_owned()))
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_UPSTREAM_BODY_LEN {
        let mut end = MAX_UPSTREAM_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
