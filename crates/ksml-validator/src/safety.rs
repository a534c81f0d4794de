//! # Safety Guard
//!
//! Walks a parsed document before structural validation and rejects
//! resource-exhaustion and injection risks, independently of schema shape.
//!
//! ## Checks, in reporting order
//!
//! 1. `steps` sequence longer than the step cap (path `steps`).
//! 2. `extensions` present but not a mapping (path `extensions`).
//! 3. `metadata.dependencies` sequence longer than the dependency cap
//!    (path `metadata.dependencies`).
//! 4. Any value nested deeper than the depth cap (path `root`).
//! 5. Suspicious content in the compact serialization; the first matching
//!    signature produces a single error (path `root`).
//! 6. Every over-long string, over-sized sequence, and over-wide mapping,
//!    each reported at its own path.
//!
//! Errors from every check accumulate; only check 5 stops early.

use ksml_core::{DocPath, ErrorCode, Limits, ValidationError};
use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Named content signatures matched case-insensitively against the
/// serialized document.
const SIGNATURES: &[(&str, &str)] = &[
    ("script_tag", r"<script[^>]*>.*?</script>"),
    ("javascript_uri", r"javascript:"),
    ("html_data_uri", r"data:text/html"),
    ("path_traversal", r"\.\./.*\.\."),
    ("passwd_access", r"[/\\]etc[/\\]passwd"),
    ("shell_metacharacter", r"[;&|`$]"),
    ("recursive_delete", r"rm\s+-rf"),
];

struct Signature {
    name: &'static str,
    regex: Regex,
}

/// Pre-validation resource and content checks.
pub struct SafetyGuard {
    limits: Limits,
    signatures: Vec<Signature>,
}

impl std::fmt::Debug for SafetyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyGuard")
            .field("limits", &self.limits)
            .field(
                "signatures",
                &self.signatures.iter().map(|s| s.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SafetyGuard {
    /// Build a guard enforcing `limits`. Signatures are compiled once here.
    pub fn new(limits: Limits) -> Result<Self, regex::Error> {
        let signatures = SIGNATURES
            .iter()
            .map(|&(name, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| Signature { name, regex })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { limits, signatures })
    }

    /// The limits this guard enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run every check and return the accumulated safety errors.
    pub fn inspect(&self, document: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.check_steps(document, &mut errors);
        self.check_extensions(document, &mut errors);
        self.check_dependencies(document, &mut errors);

        if exceeds_depth(document, 0, self.limits.max_nesting_depth) {
            errors.push(ValidationError::new(
                ErrorCode::SafetyLimitExceeded,
                format!(
                    "Safety limit exceeded: Nesting depth exceeds {}",
                    self.limits.max_nesting_depth
                ),
                "root",
            ));
        }

        if let Some(name) = self.suspicious_signature(&document.to_string()) {
            tracing::warn!(signature = name, "suspicious content detected");
            errors.push(ValidationError::new(
                ErrorCode::SafetyLimitExceeded,
                "Safety limit exceeded: Suspicious pattern detected",
                "root",
            ));
        }

        let mut path = DocPath::root();
        self.check_nodes(document, &mut path, &mut errors);
        errors
    }

    /// Name of the first signature matching `serialized`, if any.
    pub fn suspicious_signature(&self, serialized: &str) -> Option<&'static str> {
        self.signatures
            .iter()
            .find(|s| s.regex.is_match(serialized))
            .map(|s| s.name)
    }

    fn check_steps(&self, document: &Value, errors: &mut Vec<ValidationError>) {
        if let Some(Value::Array(steps)) = document.get("steps") {
            if steps.len() > self.limits.max_steps {
                errors.push(ValidationError::new(
                    ErrorCode::SafetyLimitExceeded,
                    format!(
                        "Safety limit exceeded: More than {} steps not allowed",
                        self.limits.max_steps
                    ),
                    "steps",
                ));
            }
        }
    }

    fn check_extensions(&self, document: &Value, errors: &mut Vec<ValidationError>) {
        match document.get("extensions") {
            None | Some(Value::Object(_)) => {}
            Some(_) => errors.push(ValidationError::new(
                ErrorCode::SafetyInvalidExtension,
                "Invalid extension configuration: Extensions must be an object",
                "extensions",
            )),
        }
    }

    fn check_dependencies(&self, document: &Value, errors: &mut Vec<ValidationError>) {
        let dependencies = document
            .get("metadata")
            .and_then(|metadata| metadata.get("dependencies"));
        if let Some(Value::Array(deps)) = dependencies {
            if deps.len() > self.limits.max_dependencies {
                errors.push(ValidationError::new(
                    ErrorCode::SafetyMalformedDependency,
                    format!(
                        "Malformed dependency specification: Too many dependencies ({}). Max {}",
                        deps.len(),
                        self.limits.max_dependencies
                    ),
                    "metadata.dependencies",
                ));
            }
        }
    }

    /// Pre-order walk reporting every oversized node at its own path.
    fn check_nodes(&self, value: &Value, path: &mut DocPath, errors: &mut Vec<ValidationError>) {
        match value {
            Value::String(s) => {
                let length = s.chars().count();
                if length > self.limits.max_string_length {
                    errors.push(ValidationError::new(
                        ErrorCode::SafetyLimitExceeded,
                        format!(
                            "Safety limit exceeded: String length {length} exceeds {}",
                            self.limits.max_string_length
                        ),
                        path.to_string(),
                    ));
                }
            }
            Value::Array(items) => {
                if items.len() > self.limits.max_array_size {
                    errors.push(ValidationError::new(
                        ErrorCode::SafetyLimitExceeded,
                        format!(
                            "Safety limit exceeded: Array size {} exceeds {}",
                            items.len(),
                            self.limits.max_array_size
                        ),
                        path.to_string(),
                    ));
                }
                for (index, item) in items.iter().enumerate() {
                    path.push_index(index);
                    self.check_nodes(item, path, errors);
                    path.pop();
                }
            }
            Value::Object(map) => {
                if map.len() > self.limits.max_object_keys {
                    errors.push(ValidationError::new(
                        ErrorCode::SafetyLimitExceeded,
                        format!(
                            "Safety limit exceeded: Object keys {} exceeds {}",
                            map.len(),
                            self.limits.max_object_keys
                        ),
                        path.to_string(),
                    ));
                }
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (key, child) in entries {
                    path.push_key(key.as_str());
                    self.check_nodes(child, path, errors);
                    path.pop();
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

/// Whether any value sits deeper than `max` (the root is depth 0).
fn exceeds_depth(value: &Value, depth: usize, max: usize) -> bool {
    if depth > max {
        return true;
    }
    match value {
        Value::Object(map) => map.values().any(|v| exceeds_depth(v, depth + 1, max)),
        Value::Array(items) => items.iter().any(|v| exceeds_depth(v, depth + 1, max)),
        _ => false,
    }
}
