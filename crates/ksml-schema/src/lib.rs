//! # ksml-schema — Schema Registry & Structural Validation
//!
//! Loads the canonical JSON Schema for each supported KSML format version
//! and checks documents against it, turning the matcher's unordered
//! findings into a stable, coded, path-addressed error list.
//!
//! ## Schema Registry (`registry`)
//!
//! [`SchemaRegistry`] reads `ksml_schema_v<major>.<minor>.json` files from a
//! schema directory. Each loaded schema is compiled once and cached under
//! its format version together with the file's modification time. Every
//! lookup re-reads the modification time; a changed file replaces the
//! stale entry transparently. All supported versions are preloaded at
//! startup so a missing schema is a startup failure, not a request failure.
//!
//! ## Structural Validation (`structural`)
//!
//! [`collect_findings`] runs the `jsonschema` matcher and classifies each
//! finding by structured violation kind. [`normalize`] sorts findings by
//! `(path, raw message)` and maps each kind to its `STRUCT_*` code.
//!
//! ## Crate Policy
//!
//! - Depends only on `ksml-core` internally.
//! - Schema `$id` URIs are part of the public contract and must not change
//!   within a format version.
//! - The registry never performs network access; schemas are local files.

pub mod registry;
pub mod structural;

pub use registry::{LoadedSchema, SchemaLoadError, SchemaRegistry};
pub use structural::{collect_findings, normalize, RawFinding, ViolationKind};
