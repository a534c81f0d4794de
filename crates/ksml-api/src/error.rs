//! # Transport Errors
//!
//! Every non-200 response the service produces goes through [`AppError`].
//! Transport-level failures (unparseable body, oversize document, rate
//! limiting, auth, schema unavailability) become a JSON error body; a
//! document that merely fails validation is a 200 with `valid: false`.
//! Internal error details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ksml_validator::PipelineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// `{"error": {...}}` envelope for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Code, message, and optional context of a failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "BAD_REQUEST", "RATE_LIMITED").
    pub code: String,
    /// Safe to show to the caller.
    pub message: String,
    /// Structured context; omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Request failure, rendered by its [`IntoResponse`] impl.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body could not be parsed or is not a JSON object (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid API key (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No such resource, or the resource is disabled (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Document or body exceeds the size limit (413).
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Well-formed request that cannot be processed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Client exceeded its admission window (429).
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// A dependency the service needs is not ready (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Fault inside the service (500). Only logged; the caller sees a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status and wire code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "DOCUMENT_TOO_LARGE"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotAnObject { .. } => Self::BadRequest(err.to_string()),
            PipelineError::DocumentTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            PipelineError::BatchTooLarge { .. } => Self::Validation(err.to_string()),
            PipelineError::SchemaLoad(_) | PipelineError::Signature(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
