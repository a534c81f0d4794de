//! # ksml-core — Foundational Types for the KSML Validator
//!
//! This crate is the leaf of the validator workspace. It defines the
//! externally observable verdict ([`ValidationResult`]), the stable
//! error-code taxonomy, document path rendering, the supported format
//! versions with their resolver, and the startup limit configuration.
//! Every other crate in the workspace depends on `ksml-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One envelope, one verdict.** `ValidationResult::valid` is derived
//!    from the error list at construction and cannot disagree with it.
//!
//! 2. **Closed code taxonomy.** [`ErrorCode`] is an exhaustive enum. Adding
//!    a code forces every consumer that matches on it to handle the new case.
//!
//! 3. **Total version resolution.** [`resolve_version`] accepts any JSON
//!    value (or its absence) and always yields accept or a typed rejection.
//!
//! 4. **Limits are data.** [`Limits`] and [`RateLimitConfig`] are plain values
//!    built once at startup and never mutated afterwards.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ksml-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod limits;
pub mod path;
pub mod report;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use error::ConfigError;
pub use limits::{Limits, RateLimitConfig};
pub use path::{json_type_name, DocPath, PathSegment};
pub use report::{
    BatchReport, BatchSummary, ErrorCode, Severity, ValidationError, ValidationResult,
};
pub use version::{resolve_version, FormatVersion, VersionRejection};
