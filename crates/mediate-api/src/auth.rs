//! # Authentication Middleware
//!
//! Every `/v1/*` request names its caller in a bearer token:
//!
//! ```text
//! Bearer {address}             accepted when no auth secret is configured
//! Bearer {address}:{secret}    secret must match the configured AUTH_TOKEN
//! ```
//!
//! The address becomes the [`CallerIdentity`] handed to route handlers.
//! Whether that caller may perform an operation is decided by the registry
//! and ledger, not here.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediate_core::Address;
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub address: Address,
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Constant-time comparison of secrets.
///
/// When lengths differ a dummy comparison still runs so timing does not
/// reveal the expected length.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse `{address}` or `{address}:{secret}` into a caller identity.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&str>,
) -> Result<CallerIdentity, String> {
    let (address, secret) = match provided.split_once(':') {
        Some((address, secret)) => (address, Some(secret)),
        None => (provided, None),
    };

    if let Some(expected) = expected_secret {
        match secret {
            Some(secret) if constant_time_token_eq(secret, expected) => {}
            Some(_) => return Err("invalid bearer token".into()),
            None => return Err("bearer token must carry {address}:{secret}".into()),
        }
    }

    let address = Address::new(address).map_err(|e| format!("invalid caller: {e}"))?;
    if address.is_zero() {
        return Err("the zero address cannot act as a caller".into());
    }
    Ok(CallerIdentity { address })
}

/// Extract and validate the bearer token, injecting [`CallerIdentity`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) if header_value.starts_with("Bearer ") => {
            match parse_bearer_token(&header_value[7..], expected.as_deref()) {
                Ok(identity) => {
                    request.extensions_mut().insert(identity);
                    next.run(request).await
                }
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    unauthorized_response(&msg)
                }
            }
        }
        Some(_) => {
            tracing::warn!("authentication failed: non-Bearer authorization scheme");
            unauthorized_response("authorization header must use Bearer scheme")
        }
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const CALLER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn test_app(token: Option<String>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|caller: CallerIdentity| async move { caller.address.to_string() }),
            )
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { token }))
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn address_only_accepted_without_secret() {
        let (status, body) = call(test_app(None), Some(&format!("Bearer {CALLER}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, CALLER);
    }

    #[tokio::test]
    async fn secret_required_when_configured() {
        let app = test_app(Some("s3cret".into()));
        let (status, _) = call(app.clone(), Some(&format!("Bearer {CALLER}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(app.clone(), Some(&format!("Bearer {CALLER}:wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(app, Some(&format!("Bearer {CALLER}:s3cret"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, CALLER);
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let (status, body) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let err: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(err["error"]["code"], "UNAUTHORIZED");
        assert!(err["error"]["message"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let (status, _) = call(test_app(None), Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn malformed_and_zero_addresses_rejected() {
        assert!(parse_bearer_token("not-an-address", None).is_err());
        assert!(parse_bearer_token(Address::zero().as_str(), None).is_err());
    }

    #[test]
    fn caller_address_is_normalized() {
        let identity =
            parse_bearer_token("0x70997970C51812DC3A010C7D01B50E0D17DC79C8", None).unwrap();
        assert_eq!(identity.address.as_str(), CALLER);
    }

    #[test]
    fn constant_time_eq_length_mismatch() {
        assert!(!constant_time_token_eq("short", "much-longer-secret"));
        assert!(constant_time_token_eq("same", "same"));
    }

    #[test]
    fn auth_config_debug_redacts() {
        let config = AuthConfig {
            token: Some("super-secret".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
