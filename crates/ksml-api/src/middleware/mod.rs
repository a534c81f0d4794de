//! HTTP middleware: request metrics, per-client rate limiting, and tracing.

pub mod metrics;
pub mod rate_limit;
pub mod tracing_layer;
