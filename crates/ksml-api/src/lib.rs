//! # ksml-api — HTTP Service for KSML Validation
//!
//! Axum service exposing the validation pipeline over HTTP.
//!
//! ## Routes
//!
//! | Route | Auth | Rate limited |
//! |-------|------|--------------|
//! | `POST /validate` | optional API key | yes |
//! | `POST /validate/batch` | optional API key | yes |
//! | `GET /schema`, `/schema/v0.1`, `/schema/v0.2` | no | no |
//! | `GET /health`, `/health/liveness`, `/health/readiness` | no | no |
//! | `GET /metrics`, `/openapi.json` | no | no |
//!
//! ## Middleware Stack
//!
//! Outermost to innermost:
//!
//! ```text
//! Extensions → Trace → Metrics → CORS → Compression → BodyLimit
//!     → [validate routes only] Auth → RateLimit → Handler
//! ```
//!
//! Auth runs before rate limiting so unauthenticated requests do not
//! consume a client's admission quota.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::{Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Largest request body the transport accepts.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let validate = routes::validate::router()
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware));

    Router::new()
        .merge(validate)
        .merge(routes::schema::router())
        .merge(routes::health::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(Extension(state.auth_config()))
        .layer(Extension(state.metrics.clone()))
        .layer(Extension(state.limiter.clone()))
        .with_state(state)
}
