//! # Pipeline Orchestrator
//!
//! Runs the validation stages for a single document or a batch and builds
//! the result envelope.

use std::sync::Arc;

use ksml_core::{
    json_type_name, resolve_version, BatchReport, BatchSummary, ErrorCode, Limits,
    ValidationError, ValidationResult,
};
use ksml_schema::SchemaRegistry;
use serde_json::Value;

use crate::error::PipelineError;
use crate::safety::SafetyGuard;

/// `format_version` reported for a batch entry that could not be validated.
const UNKNOWN_FORMAT: &str = "unknown";

/// The validation pipeline. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Pipeline {
    registry: Arc<SchemaRegistry>,
    guard: SafetyGuard,
    limits: Limits,
}

impl Pipeline {
    /// Assemble a pipeline over an already-populated registry.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Signature`] if a content signature fails to compile.
    pub fn new(registry: Arc<SchemaRegistry>, limits: Limits) -> Result<Self, PipelineError> {
        Ok(Self {
            registry,
            guard: SafetyGuard::new(limits)?,
            limits,
        })
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate one document.
    ///
    /// # Errors
    ///
    /// [`PipelineError::NotAnObject`] and [`PipelineError::DocumentTooLarge`]
    /// for input that cannot be judged, [`PipelineError::SchemaLoad`] when
    /// the resolved version's schema is unavailable. Every other outcome,
    /// including rejection, is an `Ok` result envelope.
    pub fn validate(&self, document: &Value) -> Result<ValidationResult, PipelineError> {
        let Value::Object(fields) = document else {
            return Err(PipelineError::NotAnObject {
                found: json_type_name(document),
            });
        };

        let size = document.to_string().len();
        if size > self.limits.max_document_size {
            tracing::warn!(size, max = self.limits.max_document_size, "document too large");
            return Err(PipelineError::DocumentTooLarge {
                size,
                max: self.limits.max_document_size,
            });
        }

        let declared = fields.get("ksml_version");
        let version = match resolve_version(declared) {
            Ok(version) => version,
            Err(rejection) => {
                tracing::warn!(reason = %rejection, "version rejected");
                return Ok(ValidationResult::rejected(
                    echo_declared(declared),
                    ValidationError::new(
                        ErrorCode::VersionRejected,
                        rejection.to_string(),
                        "ksml_version",
                    ),
                ));
            }
        };

        let schema = self.registry.load(version)?;

        if version.requires_safety_profile() {
            let safety_errors = self.guard.inspect(document);
            if !safety_errors.is_empty() {
                tracing::warn!(
                    version = %version,
                    errors = safety_errors.len(),
                    "document rejected by safety guard"
                );
                return Ok(ValidationResult::new(version.as_str(), safety_errors));
            }
        }

        let errors = schema.check(document);
        tracing::info!(
            version = %version,
            valid = errors.is_empty(),
            errors = errors.len(),
            "document validated"
        );
        Ok(ValidationResult::new(version.as_str(), errors))
    }

    /// Validate up to `max_batch_size` documents independently.
    ///
    /// A document that cannot be validated becomes an error entry in the
    /// report instead of aborting the batch.
    ///
    /// # Errors
    ///
    /// [`PipelineError::BatchTooLarge`] when the batch exceeds the cap.
    pub fn validate_batch(&self, documents: &[Value]) -> Result<BatchReport, PipelineError> {
        if documents.len() > self.limits.max_batch_size {
            return Err(PipelineError::BatchTooLarge {
                count: documents.len(),
                max: self.limits.max_batch_size,
            });
        }

        let mut summary = BatchSummary::default();
        let results = documents
            .iter()
            .enumerate()
            .map(|(index, document)| match self.validate(document) {
                Ok(result) => {
                    if result.valid {
                        summary.valid += 1;
                    } else {
                        summary.invalid += 1;
                    }
                    result
                }
                Err(err) => {
                    summary.errors += 1;
                    batch_error_entry(index, err)
                }
            })
            .collect();

        tracing::info!(
            documents = documents.len(),
            valid = summary.valid,
            invalid = summary.invalid,
            errors = summary.errors,
            "batch validated"
        );
        Ok(BatchReport { results, summary })
    }
}

/// The declared version as reported in a rejection envelope.
fn echo_declared(declared: Option<&Value>) -> String {
    match declared {
        None | Some(Value::Null) => "missing".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn batch_error_entry(index: usize, err: PipelineError) -> ValidationResult {
    let (code, message) = match &err {
        PipelineError::DocumentTooLarge { .. } => (ErrorCode::DocumentTooLarge, err.to_string()),
        _ if err.is_client_error() => (ErrorCode::InternalError, err.to_string()),
        _ => {
            tracing::error!(index, error = %err, "batch document failed");
            (ErrorCode::InternalError, "Internal validation error".to_string())
        }
    };
    ValidationResult::rejected(UNKNOWN_FORMAT, ValidationError::new(code, message, "root"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn empty_pipeline(limits: Limits) -> Pipeline {
        let registry = Arc::new(SchemaRegistry::new("/nonexistent/schemas"));
        Pipeline::new(registry, limits).unwrap()
    }

    #[test]
    fn non_objects_are_refused() {
        let pipeline = empty_pipeline(Limits::default());
        let err = pipeline.validate(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, PipelineError::NotAnObject { found: "array" }));
        assert!(err.is_client_error());
    }

    #[test]
    fn oversize_documents_are_refused_before_resolution() {
        let limits = Limits {
            max_document_size: 32,
            ..Limits::default()
        };
        let pipeline = empty_pipeline(limits);
        let doc = json!({"payload": "x".repeat(64)});
        assert!(matches!(
            pipeline.validate(&doc),
            Err(PipelineError::DocumentTooLarge { max: 32, .. })
        ));
    }

    #[test]
    fn version_rejection_needs_no_schema() {
        let pipeline = empty_pipeline(Limits::default());
        let result = pipeline.validate(&json!({"ksml_version": "9.0.0"})).unwrap();
        assert!(!result.valid);
        assert_eq!(result.format_version, "9.0.0");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::VersionRejected);
        assert_eq!(result.errors[0].path, "ksml_version");
    }

    #[test]
    fn declared_value_is_echoed() {
        assert_eq!(echo_declared(None), "missing");
        assert_eq!(echo_declared(Some(&json!(null))), "missing");
        assert_eq!(echo_declared(Some(&json!("0.9"))), "0.9");
        assert_eq!(echo_declared(Some(&json!(0.2))), "0.2");
        assert_eq!(echo_declared(Some(&json!({"v": 1}))), r#"{"v":1}"#);
    }

    #[test]
    fn missing_schema_is_an_error_not_a_verdict() {
        let pipeline = empty_pipeline(Limits::default());
        let err = pipeline.validate(&json!({"ksml_version": "0.1.0"})).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaLoad(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn batch_over_cap_is_refused_whole() {
        let pipeline = empty_pipeline(Limits::default());
        let docs = vec![json!({}); 11];
        assert!(matches!(
            pipeline.validate_batch(&docs),
            Err(PipelineError::BatchTooLarge { count: 11, max: 10 })
        ));
    }

    #[test]
    fn batch_isolates_failures() {
        let pipeline = empty_pipeline(Limits::default());
        let docs = vec![
            json!({"ksml_version": "0.1.0"}),
            json!({}),
            json!("not an object"),
        ];
        let report = pipeline.validate_batch(&docs).unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(
            report.summary,
            BatchSummary {
                valid: 0,
                invalid: 1,
                errors: 2
            }
        );

        let internal = &report.results[0];
        assert_eq!(internal.format_version, "unknown");
        assert_eq!(internal.errors[0].code, ErrorCode::InternalError);
        assert_eq!(internal.errors[0].message, "Internal validation error");
        assert_eq!(internal.errors[0].path, "root");

        assert_eq!(report.results[1].format_version, "missing");
        assert_eq!(report.results[1].errors[0].code, ErrorCode::VersionRejected);
    }
}
