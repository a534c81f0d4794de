//! # OpenAPI Specification Assembly
//!
//! Collects every utoipa-documented route into a single OpenAPI 3.1
//! document served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Registers the optional bearer API key.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer API key. Required on /validate routes when KSML_API_KEY is set.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "KSML Validator API",
        description = "Validation of KSML documents against versioned schemas.\n\nEvery document passes version resolution, a consumer-safety guard (format 0.2.0 and later), and structural schema validation. Errors carry a stable code, a path, and a deterministic order.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::validate::validate_document,
        crate::routes::validate::validate_batch,
        crate::routes::schema::get_schema,
        crate::routes::schema::get_schema_v0_1,
        crate::routes::schema::get_schema_v0_2,
        crate::routes::health::health,
        crate::routes::health::liveness,
        crate::routes::health::readiness,
        crate::routes::health::prometheus_metrics,
    ),
    components(schemas(
        ksml_core::ValidationResult,
        ksml_core::ValidationError,
        ksml_core::ErrorCode,
        ksml_core::Severity,
        ksml_core::BatchReport,
        ksml_core::BatchSummary,
        crate::routes::validate::BatchRequest,
        crate::routes::health::HealthResponse,
        crate::middleware::metrics::MetricsSnapshot,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "validation", description = "Single and batch document validation"),
        (name = "schema", description = "Canonical schema publication"),
        (name = "health", description = "Health probes and metrics"),
    )
)]
pub struct ApiDoc;

/// Router serving the generated document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
