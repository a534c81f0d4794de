//! # Schema Publication
//!
//! Serves the canonical schema documents exactly as loaded by the
//! registry, so clients can validate locally against the same rules.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use ksml_core::FormatVersion;
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Query parameters for `GET /schema`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchemaQuery {
    /// Exact version (`0.1.0`) or short alias (`v0.1`). Defaults to the newest.
    pub version: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schema", get(get_schema))
        .route("/schema/v0.1", get(get_schema_v0_1))
        .route("/schema/v0.2", get(get_schema_v0_2))
}

/// GET /schema — Canonical schema for the requested version.
#[utoipa::path(
    get,
    path = "/schema",
    params(SchemaQuery),
    responses(
        (status = 200, description = "Raw JSON Schema document"),
        (status = 400, description = "Unsupported schema version", body = ErrorBody),
        (status = 500, description = "Schema could not be loaded", body = ErrorBody),
    ),
    tag = "schema"
)]
pub(crate) async fn get_schema(
    State(state): State<AppState>,
    Query(query): Query<SchemaQuery>,
) -> Result<Json<Value>, AppError> {
    let version = match query.version.as_deref() {
        None => FormatVersion::NEWEST,
        Some(requested) => FormatVersion::from_alias(requested.trim()).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported schema version: {requested}"))
        })?,
    };
    schema_document(&state, version)
}

/// GET /schema/v0.1 — Canonical schema for format 0.1.0.
#[utoipa::path(
    get,
    path = "/schema/v0.1",
    responses((status = 200, description = "Raw JSON Schema document")),
    tag = "schema"
)]
pub(crate) async fn get_schema_v0_1(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    schema_document(&state, FormatVersion::V0_1_0)
}

/// GET /schema/v0.2 — Canonical schema for format 0.2.0.
#[utoipa::path(
    get,
    path = "/schema/v0.2",
    responses((status = 200, description = "Raw JSON Schema document")),
    tag = "schema"
)]
pub(crate) async fn get_schema_v0_2(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    schema_document(&state, FormatVersion::V0_2_0)
}

fn schema_document(state: &AppState, version: FormatVersion) -> Result<Json<Value>, AppError> {
    let schema = state
        .pipeline
        .registry()
        .load(version)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(schema.document().clone()))
}
