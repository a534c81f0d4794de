//! # ksml-cli — KSML Validator Command-Line Interface
//!
//! Runs documents through the same pipeline the HTTP service uses.
//!
//! ## Subcommands
//!
//! - `validate` — validate JSON or YAML files
//! - `schema` — print a canonical schema
//! - `versions` — list supported format versions
//!
//! ## Exit Codes
//!
//! `0` every document valid, `1` at least one invalid, `2` operational
//! failure (unreadable file, unparseable document, schema unavailable).

pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

use ksml_core::FormatVersion;

/// Every document validated cleanly.
pub const EXIT_VALID: u8 = 0;
/// At least one document failed validation.
pub const EXIT_INVALID: u8 = 1;
/// The command could not run to completion.
pub const EXIT_ERROR: u8 = 2;

/// Walk up from `start` to the nearest `schemas/` directory holding the
/// newest canonical schema.
pub fn find_schema_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("schemas"))
        .find(|candidate| candidate.join(FormatVersion::NEWEST.schema_file_name()).is_file())
}
