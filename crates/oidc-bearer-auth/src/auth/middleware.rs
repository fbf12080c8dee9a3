//! Bearer authentication middleware for HTTP transport
//!
//! This module requires the `http` feature for axum integration.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use super::error::AuthError;
use super::identity::Identity;
use super::resolver::TokenResolver;

/// Authentication state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<TokenResolver>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl AuthState {
    #[must_use]
    pub const fn new(resolver: Arc<TokenResolver>) -> Self {
        Self { resolver }
    }
}

/// Resolve the caller and attach its [`Identity`] to the request
///
/// Requests without an `Authorization` header continue as
/// [`Identity::Anonymous`]; handlers decide whether that is acceptable.
pub async fn oidc_auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request.headers().get(header::AUTHORIZATION).cloned();

    match state
        .resolver
        .resolve(authorization.as_ref().map(HeaderValue::as_bytes))
        .await
    {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl AuthError {
    /// HTTP status for a failed resolution
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.is_operational() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::UNAUTHORIZED
        }
    }

    /// RFC 6750 challenge for a failed resolution
    const fn challenge(&self) -> &'static str {
        match self {
            Self::MalformedAuthHeader(_) => "Bearer error=\"invalid_request\"",
            _ => "Bearer error=\"invalid_token\"",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return (
                status,
                Json(ErrorBody {
                    error: "authentication_unavailable",
                }),
            )
                .into_response();
        }

        (
            status,
            [(header::WWW_AUTHENTICATE, self.challenge())],
            Json(ErrorBody {
                error: "unauthorized",
            }),
        )
            .into_response()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            tracing::error!("Identity extractor used on a route without the auth middleware");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{BearerToken, Claims, IdentityProvider, Result};
    use crate::cache::{InMemoryCache, VerificationCache};

    /// Accepts `good` via userinfo and `svc` via introspection
    struct StaticProvider {
        userinfo: bool,
    }

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn fetch_userinfo(&self, token: &BearerToken) -> Result<Claims> {
            match token.expose() {
                "good" => Ok(json!({"sub": "u1"}).as_object().cloned().unwrap_or_default()),
                _ => Err(AuthError::Upstream {
                    status: 401,
                    body: String::new(),
                }),
            }
        }

        async fn fetch_introspection(&self, token: &BearerToken) -> Result<Claims> {
            match token.expose() {
                "svc" => Ok(json!({"client_id": "c1"}).as_object().cloned().unwrap_or_default()),
                _ => Err(AuthError::Upstream {
                    status: 401,
                    body: String::new(),
                }),
            }
        }

        fn has_userinfo(&self) -> bool {
            self.userinfo
        }

        fn has_introspection(&self) -> bool {
            true
        }
    }

    async fn whoami(identity: Identity) -> String {
        format!("{}:{}", identity.kind().as_str(), identity.subject().unwrap_or("-"))
    }

    fn app(userinfo: bool) -> Router {
        let resolver = TokenResolver::new(
            Arc::new(StaticProvider { userinfo }),
            VerificationCache::new(Arc::new(InMemoryCache::new())),
            Duration::from_secs(60),
        );
        let state = AuthState::new(Arc::new(resolver));

        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(state, oidc_auth_middleware))
    }

    fn request(auth_header: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/whoami").method("GET");
        if let Some(header) = auth_header {
            builder = builder.header(header::AUTHORIZATION, header);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_header_reaches_handler_as_anonymous() {
        let response = app(true).oneshot(request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous:-");
    }

    #[tokio::test]
    async fn test_user_token_reaches_handler() {
        let response = app(true)
            .oneshot(request(Some("Bearer good")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "user:u1");
    }

    #[tokio::test]
    async fn test_client_token_reaches_handler() {
        let response = app(true)
            .oneshot(request(Some("Bearer svc")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "client:c1");
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        let response = app(true)
            .oneshot(request(Some("Basic dXNlcjpwYXNz")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
        assert_eq!(challenge, "Bearer error=\"invalid_request\"");
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthorized() {
        let response = app(true)
            .oneshot(request(Some("Bearer nope")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
        assert!(challenge.to_str().unwrap().starts_with("Bearer"));
        assert!(!body_string(response).await.contains("nope"));
    }

    #[tokio::test]
    async fn test_misconfigured_provider_is_server_error() {
        let response = app(false)
            .oneshot(request(Some("Bearer good")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_identity_extractor_without_middleware() {
        let app = Router::new().route("/whoami", get(whoami));
        let response = app.oneshot(request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::Timeout.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::misconfigured("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Upstream {
                status: 500,
                body: String::new()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
