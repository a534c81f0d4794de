//! # Validate Subcommand
//!
//! Validates KSML documents from disk. `.yaml`/`.yml` files are parsed as
//! YAML, `.json` as JSON; any other extension is tried as JSON first and
//! YAML second (every JSON document is also YAML, so the order only
//! affects error messages).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ksml_core::{Limits, ValidationResult};
use ksml_schema::SchemaRegistry;
use ksml_validator::Pipeline;
use serde::Serialize;
use serde_json::Value;

use crate::{EXIT_INVALID, EXIT_VALID};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Documents to validate (JSON or YAML).
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Verdict for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, schema_dir: &Path) -> Result<u8> {
    let reports = validate_files(&args.paths, schema_dir)?;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&reports)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("failed to serialize report")?
        ),
    }

    Ok(exit_code(&reports))
}

/// Validate every file, stopping at the first one that cannot be judged.
pub fn validate_files(paths: &[PathBuf], schema_dir: &Path) -> Result<Vec<FileReport>> {
    let registry = SchemaRegistry::open(schema_dir)
        .with_context(|| format!("failed to load schemas from {}", schema_dir.display()))?;
    let limits = Limits::from_env().context("invalid limit configuration")?;
    let pipeline = Pipeline::new(Arc::new(registry), limits)?;

    paths
        .iter()
        .map(|path| {
            let document = load_document(path)?;
            let result = pipeline
                .validate(&document)
                .with_context(|| format!("failed to validate {}", path.display()))?;
            tracing::debug!(path = %path.display(), valid = result.valid, "validated");
            Ok(FileReport {
                path: path.display().to_string(),
                result,
            })
        })
        .collect()
}

/// Read and parse a document by extension.
pub fn load_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse YAML in {}", path.display())),
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse JSON in {}", path.display())),
        _ => serde_json::from_str(&text).or_else(|json_err| {
            serde_yaml::from_str(&text).with_context(|| {
                format!(
                    "{} is neither JSON ({json_err}) nor YAML",
                    path.display()
                )
            })
        }),
    }
}

/// Human-readable report, one block per file.
pub fn render_text(reports: &[FileReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let result = &report.result;
        if result.valid {
            out.push_str(&format!(
                "PASS {} (ksml {})\n",
                report.path, result.format_version
            ));
            continue;
        }
        out.push_str(&format!(
            "FAIL {} (ksml {}): {} error(s)\n",
            report.path,
            result.format_version,
            result.errors.len()
        ));
        for error in &result.errors {
            out.push_str(&format!("  [{}] {}: {}\n", error.code, error.path, error.message));
        }
    }

    let valid = reports.iter().filter(|r| r.result.valid).count();
    out.push_str(&format!(
        "\n{valid} of {} document(s) valid\n",
        reports.len()
    ));
    out
}

pub fn exit_code(reports: &[FileReport]) -> u8 {
    if reports.iter().all(|r| r.result.valid) {
        EXIT_VALID
    } else {
        EXIT_INVALID
    }
}
