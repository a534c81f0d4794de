//! # Structural Validation & Error Normalization
//!
//! The schema matcher reports findings in traversal order with free-form
//! messages. This module classifies each finding by its structured kind
//! (never by parsing message text), addresses it with a [`DocPath`], and
//! normalizes the set into coded [`ValidationError`]s:
//!
//! | Finding                | Code                      | Message                                         |
//! |------------------------|---------------------------|-------------------------------------------------|
//! | required field absent  | `STRUCT_MISSING_FIELD`    | `Required field missing: <field>`               |
//! | wrong JSON type        | `STRUCT_TYPE_MISMATCH`    | `Type mismatch: expected <t>, got <actual>`     |
//! | field not permitted    | `STRUCT_UNKNOWN_FIELD`    | `Unknown field '<field>' is not allowed`        |
//! | anything else          | `STRUCT_SCHEMA_VIOLATION` | `Schema violation: <raw message>`               |
//!
//! Findings are sorted by rendered path, then raw message, so equal inputs
//! always produce identical output regardless of matcher traversal order.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::Validator;
use ksml_core::{json_type_name, DocPath, ErrorCode, ValidationError};
use serde_json::Value;

use crate::registry::LoadedSchema;

/// Structured classification of a raw finding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViolationKind {
    MissingField { field: String },
    TypeMismatch { expected: String, actual: String },
    UnknownField { field: String },
    Other,
}

/// One finding from the schema matcher, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFinding {
    pub path: DocPath,
    pub kind: ViolationKind,
    /// The matcher's own message, used as the secondary sort key and as
    /// the body of `Schema violation` messages.
    pub message: String,
}

/// Run `validator` over `document` and classify every finding.
///
/// A finding that rejects several unexpected fields at once is split into
/// one finding per field.
pub fn collect_findings(validator: &Validator, document: &Value) -> Vec<RawFinding> {
    let mut findings = Vec::new();
    for error in validator.iter_errors(document) {
        let message = error.to_string();
        let path = DocPath::from_pointer(&error.instance_path.to_string(), document);
        let actual = json_type_name(&error.instance);

        match error.kind {
            ValidationErrorKind::Required { property } => {
                let field = match property {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                findings.push(RawFinding {
                    path,
                    kind: ViolationKind::MissingField { field },
                    message,
                });
            }
            ValidationErrorKind::Type { kind } => {
                let expected = match kind {
                    TypeKind::Single(t) => t.to_string(),
                    TypeKind::Multiple(types) => types
                        .into_iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join(" or "),
                };
                findings.push(RawFinding {
                    path,
                    kind: ViolationKind::TypeMismatch {
                        expected,
                        actual: actual.to_string(),
                    },
                    message,
                });
            }
            ValidationErrorKind::AdditionalProperties { mut unexpected } => {
                unexpected.sort();
                for field in unexpected {
                    findings.push(RawFinding {
                        path: path.clone(),
                        kind: ViolationKind::UnknownField { field },
                        message: message.clone(),
                    });
                }
            }
            _ => findings.push(RawFinding {
                path,
                kind: ViolationKind::Other,
                message,
            }),
        }
    }
    findings
}

/// Sort findings deterministically and map them to coded errors.
///
/// Ordering is by rendered path, then raw message, then kind; the last key
/// only separates findings split from one multi-field rejection.
pub fn normalize(findings: Vec<RawFinding>) -> Vec<ValidationError> {
    let mut keyed: Vec<(String, RawFinding)> = findings
        .into_iter()
        .map(|finding| (finding.path.to_string(), finding))
        .collect();
    keyed.sort_by(|(pa, a), (pb, b)| {
        pa.cmp(pb)
            .then_with(|| a.message.cmp(&b.message))
            .then_with(|| a.kind.cmp(&b.kind))
    });

    keyed
        .into_iter()
        .map(|(path, finding)| {
            let (code, message) = match finding.kind {
                ViolationKind::MissingField { field } => (
                    ErrorCode::StructMissingField,
                    format!("Required field missing: {field}"),
                ),
                ViolationKind::TypeMismatch { expected, actual } => (
                    ErrorCode::StructTypeMismatch,
                    format!("Type mismatch: expected {expected}, got {actual}"),
                ),
                ViolationKind::UnknownField { field } => (
                    ErrorCode::StructUnknownField,
                    format!("Unknown field '{field}' is not allowed"),
                ),
                ViolationKind::Other => (
                    ErrorCode::StructSchemaViolation,
                    format!("Schema violation: {}", finding.message),
                ),
            };
            ValidationError::new(code, message, path)
        })
        .collect()
}

impl LoadedSchema {
    /// Check `document` against this schema and return normalized errors.
    pub fn check(&self, document: &Value) -> Vec<ValidationError> {
        let errors = normalize(collect_findings(self.validator(), document));
        tracing::debug!(
            version = %self.version(),
            errors = errors.len(),
            "structural validation complete"
        );
        errors
    }
}
