//! # Request Metrics
//!
//! In-process atomic counters reported by `/health`, mirrored into the
//! `metrics` facade so an installed Prometheus recorder exports them at
//! `/metrics`. Without a recorder the facade calls are no-ops.
//!
//! `total_requests` counts calls that reach a validate handler; health,
//! schema, and metrics traffic only shows up in the per-route HTTP series.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use utoipa::ToSchema;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    total_requests: Arc<AtomicU64>,
    valid_requests: Arc<AtomicU64>,
    invalid_requests: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    rate_limited: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub valid_requests: u64,
    pub invalid_requests: u64,
    pub errors: u64,
    pub rate_limited: u64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call to a validate endpoint.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ksml_validate_requests_total").increment(1);
    }

    /// Count one validated document by verdict.
    pub fn record_verdict(&self, valid: bool) {
        let (counter, outcome) = if valid {
            (&self.valid_requests, "valid")
        } else {
            (&self.invalid_requests, "invalid")
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ksml_documents_validated_total", "outcome" => outcome).increment(1);
    }

    /// Count a request or batch entry the validator could not judge.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ksml_validation_errors_total").increment(1);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ksml_rate_limited_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            valid_requests: self.valid_requests.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }
}

/// Middleware that records per-route HTTP series and counts server errors.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    metrics::counter!(
        "ksml_http_requests_total",
        "method" => method,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("ksml_http_request_duration_seconds")
        .record(started.elapsed().as_secs_f64());

    if let Some(m) = metrics.filter(|_| status.is_server_error()) {
        m.record_error();
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let snapshot = ApiMetrics::new().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.errors, 0);
    }

    #[test]
    fn clones_share_counters() {
        let metrics = ApiMetrics::new();
        let clone = metrics.clone();
        clone.record_request();
        clone.record_verdict(true);
        clone.record_verdict(false);
        clone.record_verdict(false);
        clone.record_rate_limited();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                total_requests: 1,
                valid_requests: 1,
                invalid_requests: 2,
                errors: 0,
                rate_limited: 1,
            }
        );
    }
}
