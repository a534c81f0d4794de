//! # ksml-validator — Document Validation Pipeline
//!
//! Sequences version resolution, schema selection, the Safety Guard, and
//! structural checking into one verdict per document.
//!
//! ```text
//! document ─▶ size check ─▶ resolve_version ─▶ SchemaRegistry::load
//!                                  │                    │
//!                          VERSION_REJECTED             ▼
//!                                             SafetyGuard (0.2.0 only)
//!                                                       │
//!                                         SAFETY_* ◀────┤
//!                                                       ▼
//!                                           structural check ─▶ STRUCT_*
//! ```
//!
//! Each document ends in exactly one of three outcomes: version-rejected
//! (one error), safety-rejected (every safety error, no structural ones),
//! or schema-checked (zero or more structural errors).
//!
//! The [`Pipeline`] holds no per-call state. The only shared mutable state
//! it reaches is the registry's schema cache, so one pipeline is built at
//! startup and shared across all concurrent callers.

pub mod error;
pub mod pipeline;
pub mod safety;

pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use safety::SafetyGuard;
