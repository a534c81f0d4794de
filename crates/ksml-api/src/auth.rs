//! # API-Key Authentication
//!
//! Optional bearer-token gate for the validation routes. When an API key
//! is configured, requests must carry `Authorization: Bearer <key>`; the
//! comparison is constant-time. Without a key every request passes.
//!
//! Schema, health, metrics, and OpenAPI routes are never gated.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the key value to prevent credential leakage in logs.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthConfig {
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ a dummy comparison runs so timing does not reveal
/// the expected length.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Check the `Authorization` header value against the expected key.
pub fn check_bearer(header_value: Option<&str>, expected: &str) -> Result<(), AppError> {
    match header_value {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) if constant_time_token_eq(provided.trim(), expected) => Ok(()),
            Some(_) => Err(AppError::Unauthorized("invalid API key".into())),
            None => Err(AppError::Unauthorized(
                "authorization header must use Bearer scheme".into(),
            )),
        },
        None => Err(AppError::Unauthorized("missing authorization header".into())),
    }
}

/// Reject requests without a valid API key when one is configured.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request.extensions().get::<AuthConfig>().cloned();

    if let Some(AuthConfig {
        api_key: Some(expected),
    }) = config
    {
        let header_value = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if let Err(err) = check_bearer(header_value, &expected) {
            tracing::warn!(error = %err, "authentication failed");
            return err.into_response();
        }
    }

    next.run(request).await
}
