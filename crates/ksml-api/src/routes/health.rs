//! # Health and Metrics
//!
//! Unauthenticated operational endpoints: the health report, Kubernetes
//! style liveness/readiness probes, and the Prometheus scrape endpoint.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use ksml_core::FormatVersion;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::middleware::metrics::MetricsSnapshot;
use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Service build version.
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub supported_versions: Vec<String>,
    pub auth_enabled: bool,
    pub metrics: MetricsSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
}

/// GET /health — Service status and request counters.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health report", body = HealthResponse)),
    tag = "health"
)]
pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        started_at: state.started_at,
        uptime_seconds: state.uptime_seconds(),
        supported_versions: FormatVersion::ALL.iter().map(|v| v.to_string()).collect(),
        auth_enabled: state.auth_config().enabled(),
        metrics: state.metrics.snapshot(),
    })
}

/// GET /health/liveness — The process is up.
#[utoipa::path(
    get,
    path = "/health/liveness",
    responses((status = 200, description = "Alive", body = String)),
    tag = "health"
)]
pub(crate) async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness — Every supported schema loads.
#[utoipa::path(
    get,
    path = "/health/readiness",
    responses(
        (status = 200, description = "Ready to validate", body = String),
        (status = 503, description = "A schema is unavailable", body = ErrorBody),
    ),
    tag = "health"
)]
pub(crate) async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    let registry = state.pipeline.registry();
    for version in FormatVersion::ALL {
        if let Err(err) = registry.load(version) {
            tracing::warn!(%version, error = %err, "readiness check failed");
            return Err(AppError::ServiceUnavailable(format!(
                "schema for {version} unavailable"
            )));
        }
    }
    Ok("ready")
}

/// GET /metrics — Prometheus text exposition.
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus metrics", body = String, content_type = "text/plain"),
        (status = 404, description = "No metrics recorder installed", body = ErrorBody),
    ),
    tag = "health"
)]
pub(crate) async fn prometheus_metrics(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .prometheus()
        .ok_or_else(|| AppError::NotFound("metrics recorder not installed".into()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
