//! # ksml CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ksml_cli::schema::{run_schema, run_versions, SchemaArgs};
use ksml_cli::validate::{run_validate, ValidateArgs};
use ksml_cli::{find_schema_dir, EXIT_ERROR};

/// KSML validator CLI.
///
/// Validates KSML documents against the canonical versioned schemas with
/// the same pipeline as the HTTP service.
#[derive(Parser, Debug)]
#[command(name = "ksml", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the canonical schemas. Defaults to the nearest
    /// ancestor `schemas/` directory.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate JSON or YAML documents.
    Validate(ValidateArgs),

    /// Print a canonical schema.
    Schema(SchemaArgs),

    /// List supported format versions.
    Versions,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr so `--format json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let schema_dir = cli.schema_dir.clone().unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|cwd| find_schema_dir(&cwd))
            .unwrap_or_else(|| {
                tracing::warn!("no schemas/ directory found above the current directory");
                PathBuf::from("schemas")
            })
    });

    tracing::debug!(schema_dir = %schema_dir.display(), "resolved schema directory");

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args, &schema_dir),
        Commands::Schema(args) => run_schema(args, &schema_dir),
        Commands::Versions => run_versions(),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
