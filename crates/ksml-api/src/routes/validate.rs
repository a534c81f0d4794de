//! # Validation Routes
//!
//! `POST /validate` and `POST /validate/batch`. A document that fails
//! validation is a 200 with `valid: false`; only transport failures (bad
//! JSON, non-object body, oversize document, batch over the cap) produce
//! an error body.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ksml_core::{BatchReport, ErrorCode, ValidationResult};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_json;
use crate::state::AppState;

/// Request body for `POST /validate/batch`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// Documents to validate, in order.
    #[schema(value_type = Vec<Object>)]
    pub documents: Vec<Value>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_document))
        .route("/validate/batch", post(validate_batch))
}

/// POST /validate — Validate a single KSML document.
#[utoipa::path(
    post,
    path = "/validate",
    responses(
        (status = 200, description = "Validation verdict", body = ValidationResult),
        (status = 400, description = "Body is not a JSON object", body = ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 413, description = "Document too large", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    tag = "validation"
)]
pub(crate) async fn validate_document(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ValidationResult>, AppError> {
    state.metrics.record_request();
    let document = extract_json(body)?;
    let result = state.pipeline.validate(&document)?;

    state.metrics.record_verdict(result.valid);

    Ok(Json(result))
}

/// POST /validate/batch — Validate several documents in one request.
#[utoipa::path(
    post,
    path = "/validate/batch",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Per-document verdicts and summary", body = BatchReport),
        (status = 400, description = "Malformed request body", body = ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 422, description = "Batch exceeds the size cap", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    tag = "validation"
)]
pub(crate) async fn validate_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError> {
    state.metrics.record_request();
    let request = extract_json(body)?;
    let report = state.pipeline.validate_batch(&request.documents)?;

    for result in &report.results {
        let unjudged = result
            .errors
            .iter()
            .any(|e| matches!(e.code, ErrorCode::InternalError | ErrorCode::DocumentTooLarge));
        if unjudged {
            state.metrics.record_error();
        } else {
            state.metrics.record_verdict(result.valid);
        }
    }

    Ok(Json(report))
}
