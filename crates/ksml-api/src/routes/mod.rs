//! # Route Modules
//!
//! - `validate`: single and batch document validation (authenticated,
//!   rate limited).
//! - `schema`: canonical schema publication.
//! - `health`: health report, probes, and the Prometheus scrape endpoint.

pub mod health;
pub mod schema;
pub mod validate;
