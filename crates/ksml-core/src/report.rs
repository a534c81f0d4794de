//! # Validation Report Types
//!
//! The result envelope returned for every document, the closed error-code
//! taxonomy, and the batch summary.
//!
//! ## Invariants
//!
//! - `ValidationResult` is `#[non_exhaustive]` and serialize-only, so
//!   outside this crate it is built through `new` or `rejected`, both of
//!   which derive `valid` from `errors`. Its fields stay public for reading.
//! - No error is ever downgraded to a warning. `warnings` carries advisory
//!   notices only and is empty for every behavior implemented today.
//! - All types serialize deterministically (fields in declaration order,
//!   codes and severities as fixed strings).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity attached to a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Stable, machine-readable error codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The validator itself failed (schema unavailable, unexpected fault).
    InternalError,
    /// A batch entry exceeded the document size limit.
    DocumentTooLarge,
    /// The declared format version was rejected.
    VersionRejected,
    /// A consumer-safety limit was exceeded or suspicious content was found.
    SafetyLimitExceeded,
    /// The `extensions` block is not a mapping.
    SafetyInvalidExtension,
    /// The dependency list is malformed or too long.
    SafetyMalformedDependency,
    /// A required field is absent.
    StructMissingField,
    /// A value has the wrong JSON type.
    StructTypeMismatch,
    /// A field is not permitted by the schema.
    StructUnknownField,
    /// Any other schema constraint failed.
    StructSchemaViolation,
}

impl ErrorCode {
    /// All codes, in taxonomy order.
    pub const ALL: [ErrorCode; 10] = [
        Self::InternalError,
        Self::DocumentTooLarge,
        Self::VersionRejected,
        Self::SafetyLimitExceeded,
        Self::SafetyInvalidExtension,
        Self::SafetyMalformedDependency,
        Self::StructMissingField,
        Self::StructTypeMismatch,
        Self::StructUnknownField,
        Self::StructSchemaViolation,
    ];

    /// The wire representation of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InternalError => "INTERNAL_ERROR",
            Self::DocumentTooLarge => "DOCUMENT_TOO_LARGE",
            Self::VersionRejected => "VERSION_REJECTED",
            Self::SafetyLimitExceeded => "SAFETY_LIMIT_EXCEEDED",
            Self::SafetyInvalidExtension => "SAFETY_INVALID_EXTENSION",
            Self::SafetyMalformedDependency => "SAFETY_MALFORMED_DEPENDENCY",
            Self::StructMissingField => "STRUCT_MISSING_FIELD",
            Self::StructTypeMismatch => "STRUCT_TYPE_MISMATCH",
            Self::StructUnknownField => "STRUCT_UNKNOWN_FIELD",
            Self::StructSchemaViolation => "STRUCT_SCHEMA_VIOLATION",
        }
    }

    /// Severity every error with this code is reported at.
    pub fn severity(&self) -> Severity {
        // Every code currently blocks acceptance.
        Severity::Error
    }

    /// Whether this code is produced by the Safety Guard.
    pub fn is_safety(&self) -> bool {
        matches!(
            self,
            Self::SafetyLimitExceeded | Self::SafetyInvalidExtension | Self::SafetyMalformedDependency
        )
    }

    /// Whether this code is produced by the structural normalizer.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::StructMissingField
                | Self::StructTypeMismatch
                | Self::StructUnknownField
                | Self::StructSchemaViolation
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified, path-addressed error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Dot/bracket path of the offending node, or `root`.
    pub path: String,
    /// Severity derived from the code.
    pub severity: Severity,
}

impl ValidationError {
    /// Build an error at the code's default severity.
    pub fn new(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
            severity: code.severity(),
        }
    }
}

/// The verdict for one document.
///
/// Built only through [`ValidationResult::new`] or
/// [`ValidationResult::rejected`]:
///
/// ```compile_fail
/// let forged = ksml_core::ValidationResult {
///     valid: true,
///     format_version: "0.2.0".into(),
///     errors: Vec::new(),
///     warnings: Vec::new(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[non_exhaustive]
pub struct ValidationResult {
    /// `true` exactly when `errors` is empty.
    pub valid: bool,
    /// The resolved format version, or the declared value when rejected.
    pub format_version: String,
    /// Errors in deterministic order.
    pub errors: Vec<ValidationError>,
    /// Non-blocking advisories.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Assemble a result; validity is derived from `errors`.
    pub fn new(format_version: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            format_version: format_version.into(),
            errors,
            warnings: Vec::new(),
        }
    }

    /// A result carrying a single error.
    pub fn rejected(format_version: impl Into<String>, error: ValidationError) -> Self {
        Self::new(format_version, vec![error])
    }
}

/// Per-batch outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    /// Documents that validated cleanly.
    pub valid: usize,
    /// Documents rejected with validation errors.
    pub invalid: usize,
    /// Documents whose validation could not be carried out.
    pub errors: usize,
}

/// Results for every document of a batch, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchReport {
    pub results: Vec<ValidationResult>,
    pub summary: BatchSummary,
}
