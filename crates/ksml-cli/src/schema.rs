//! # Schema and Versions Subcommands
//!
//! `ksml schema` prints a canonical schema exactly as the registry loads
//! it; `ksml versions` lists the supported format versions.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use ksml_core::FormatVersion;
use ksml_schema::SchemaRegistry;
use serde_json::Value;

use crate::EXIT_VALID;

/// Arguments for the schema subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Exact version (`0.1.0`) or short alias (`v0.1`). Defaults to the newest.
    #[arg(long)]
    pub version: Option<String>,
}

/// Execute the schema subcommand.
pub fn run_schema(args: &SchemaArgs, schema_dir: &Path) -> Result<u8> {
    let document = schema_document(args.version.as_deref(), schema_dir)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&document).context("failed to serialize schema")?
    );
    Ok(EXIT_VALID)
}

/// Load the schema document for `requested`, or the newest version.
pub fn schema_document(requested: Option<&str>, schema_dir: &Path) -> Result<Value> {
    let version = match requested {
        None => FormatVersion::NEWEST,
        Some(v) => FormatVersion::from_alias(v.trim()).with_context(|| {
            format!(
                "unsupported schema version: {v} (supported: {})",
                FormatVersion::supported_list()
            )
        })?,
    };

    let schema = SchemaRegistry::new(schema_dir)
        .load(version)
        .with_context(|| format!("failed to load schema for {version}"))?;
    Ok(schema.document().clone())
}

/// Execute the versions subcommand.
pub fn run_versions() -> Result<u8> {
    for line in versions_listing() {
        println!("{line}");
    }
    Ok(EXIT_VALID)
}

/// One line per supported version; the safety-profiled one is marked.
pub fn versions_listing() -> Vec<String> {
    FormatVersion::ALL
        .iter()
        .map(|v| {
            let mut line = format!("{} ({})", v, v.short_alias());
            if v.requires_safety_profile() {
                line.push_str("  [safety profile]");
            }
            if *v == FormatVersion::NEWEST {
                line.push_str("  [default]");
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_marks_safety_profile() {
        let lines = versions_listing();
        assert_eq!(lines.len(), FormatVersion::ALL.len());
        assert_eq!(lines[0], "0.1.0 (v0.1)");
        assert_eq!(lines[1], "0.2.0 (v0.2)  [safety profile]  [default]");
    }

    #[test]
    fn unknown_version_is_rejected_before_loading() {
        let err = schema_document(Some("1.0"), Path::new("/nonexistent")).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version: 1.0"));
    }

    #[test]
    fn missing_schema_dir_is_an_error() {
        let err = schema_document(None, Path::new("/nonexistent")).unwrap_err();
        assert!(err.to_string().contains("failed to load schema for 0.2.0"));
    }
}
