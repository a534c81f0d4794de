//! Errors that prevent the pipeline from producing a verdict.
//!
//! A rejected document is not an error here; it is a [`ValidationResult`]
//! with `valid == false`. These variants cover input the pipeline cannot
//! judge at all and faults inside the validator itself.
//!
//! [`ValidationResult`]: ksml_core::ValidationResult

use ksml_schema::SchemaLoadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input is not a JSON object.
    #[error("document must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// The serialized document exceeds the size limit.
    #[error("Document too large: {size} bytes exceeds limit of {max} bytes")]
    DocumentTooLarge { size: usize, max: usize },

    /// The batch holds more documents than allowed.
    #[error("Batch too large: {count} documents exceeds limit of {max}")]
    BatchTooLarge { count: usize, max: usize },

    /// The schema for the resolved version could not be loaded.
    #[error("schema unavailable: {0}")]
    SchemaLoad(#[from] SchemaLoadError),

    /// A suspicious-content signature failed to compile.
    #[error("invalid content signature: {0}")]
    Signature(#[from] regex::Error),
}

impl PipelineError {
    /// Whether the caller caused this error (as opposed to the validator).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotAnObject { .. } | Self::DocumentTooLarge { .. } | Self::BatchTooLarge { .. }
        )
    }
}
