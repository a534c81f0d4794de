//! Pipeline contract: outcome precedence, exact error shapes, determinism,
//! and batch isolation against the repository schemas.

use std::path::PathBuf;
use std::sync::Arc;

use ksml_core::{ErrorCode, Limits};
use ksml_schema::SchemaRegistry;
use ksml_validator::{Pipeline, PipelineError};
use proptest::prelude::*;
use serde_json::{json, Value};

fn repo_schemas() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop();
    dir.pop();
    dir.join("schemas")
}

fn pipeline() -> Pipeline {
    let registry = Arc::new(SchemaRegistry::open(repo_schemas()).expect("schemas load"));
    Pipeline::new(registry, Limits::default()).expect("pipeline builds")
}

fn v02_document() -> Value {
    json!({
        "ksml_version": "0.2.0",
        "metadata": {
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "author": "release-team",
            "title": "Build and publish",
            "created_at": "2024-01-15T10:30:00Z",
            "version": "1.2.0",
            "environment": "staging",
            "dependencies": [{"name": "base-image", "version": "2.1.0"}]
        },
        "configurations": {"max_retries": 2, "timeout_seconds": 600},
        "steps": [
            {
                "name": "compile",
                "action": "build",
                "parameters": {"target": "release"},
                "timeout_override": 120,
                "retry_policy": {"max_attempts": 3, "backoff_seconds": 5},
                "conditions": [{"type": "run_if", "expression": "branch == 'main'"}]
            },
            {"name": "publish", "action": "upload", "parameters": {}, "on_failure": "abort"}
        ],
        "extensions": {
            "x-capabilities": ["retry", "timeout"],
            "x-metadata_extensions": {"validation_mode": "strict"}
        }
    })
}

fn v01_document() -> Value {
    json!({
        "ksml_version": "0.1.0",
        "metadata": {
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "author": "release-team",
            "title": "Build",
            "created_at": "2024-01-15T10:30:00Z"
        },
        "configurations": {},
        "steps": [{"name": "compile", "action": "build", "parameters": {}}]
    })
}

fn many_steps(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({"name": format!("step{i}"), "action": "run", "parameters": {}}))
        .collect()
}

#[test]
fn conforming_documents_are_valid() {
    let pipeline = pipeline();
    for doc in [v01_document(), v02_document()] {
        let result = pipeline.validate(&doc).unwrap();
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.format_version, doc["ksml_version"]);
    }
}

#[test]
fn missing_version_is_one_rejection_at_ksml_version() {
    let mut doc = v02_document();
    doc.as_object_mut().unwrap().remove("ksml_version");
    let result = pipeline().validate(&doc).unwrap();
    assert!(!result.valid);
    assert_eq!(result.format_version, "missing");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::VersionRejected);
    assert_eq!(result.errors[0].path, "ksml_version");
    assert_eq!(result.errors[0].message, "Missing required field 'ksml_version'");
}

#[test]
fn every_rejected_version_yields_exactly_one_error() {
    let pipeline = pipeline();
    let cases = [
        (json!("invalid.version"), "invalid.version"),
        (json!("1.0.0"), "1.0.0"),
        (json!("0.3.0"), "0.3.0"),
        (json!("0.1.5"), "0.1.5"),
        (json!(""), ""),
        (json!(2), "2"),
        (json!(["0.2.0"]), r#"["0.2.0"]"#),
    ];
    for (declared, echoed) in cases {
        let mut doc = v02_document();
        doc["ksml_version"] = declared;
        // Structural and safety problems must not leak into a version rejection.
        doc["steps"] = json!(many_steps(150));
        doc["metadata"] = json!("broken");
        let result = pipeline.validate(&doc).unwrap();
        assert_eq!(result.errors.len(), 1, "{echoed}");
        assert_eq!(result.errors[0].code, ErrorCode::VersionRejected);
        assert_eq!(result.format_version, echoed);
    }
}

#[test]
fn step_overflow_is_a_single_safety_error() {
    let mut doc = v02_document();
    doc["steps"] = json!(many_steps(101));
    let result = pipeline().validate(&doc).unwrap();
    assert!(!result.valid);
    assert_eq!(result.format_version, "0.2.0");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::SafetyLimitExceeded);
    assert_eq!(result.errors[0].path, "steps");
}

#[test]
fn safety_errors_suppress_structural_errors() {
    let mut doc = v02_document();
    doc["extensions"] = json!("not-an-object");
    doc["metadata"].as_object_mut().unwrap().remove("author");
    doc["bogus_field"] = json!(true);
    let result = pipeline().validate(&doc).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::SafetyInvalidExtension);
    assert!(result.errors.iter().all(|e| e.code.is_safety()));
}

#[test]
fn older_format_skips_the_safety_guard() {
    let mut doc = v01_document();
    doc["steps"] = json!(many_steps(101));
    let result = pipeline().validate(&doc).unwrap();
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn suspicious_content_is_rejected_once() {
    let mut doc = v02_document();
    doc["steps"][0]["parameters"] = json!({
        "command": "rm -rf /",
        "hook": "<script>alert(1)</script>",
        "path": "../../etc/passwd"
    });
    let result = pipeline().validate(&doc).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, "root");
    assert_eq!(
        result.errors[0].message,
        "Safety limit exceeded: Suspicious pattern detected"
    );
}

#[test]
fn deep_nesting_is_rejected_at_root() {
    let mut nested = json!("leaf");
    for _ in 0..12 {
        nested = json!({ "inner": nested });
    }
    let mut doc = v02_document();
    doc["steps"][0]["parameters"] = nested;
    let result = pipeline().validate(&doc).unwrap();
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "root" && e.message.contains("Nesting depth exceeds 10")));
    assert!(result.errors.iter().all(|e| e.code.is_safety()));
}

#[test]
fn too_many_dependencies_is_malformed() {
    let mut doc = v02_document();
    let deps: Vec<_> = (0..60)
        .map(|i| json!({"name": format!("dep{i}"), "version": "1.0.0"}))
        .collect();
    doc["metadata"]["dependencies"] = json!(deps);
    let result = pipeline().validate(&doc).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::SafetyMalformedDependency);
    assert_eq!(
        result.errors[0].message,
        "Malformed dependency specification: Too many dependencies (60). Max 50"
    );
}

#[test]
fn missing_metadata_fields_are_each_reported() {
    let mut doc = v02_document();
    doc["metadata"] = json!({"id": "550e8400-e29b-41d4-a716-446655440000"});
    let result = pipeline().validate(&doc).unwrap();
    assert_eq!(result.errors.len(), 3);
    assert!(result
        .errors
        .iter()
        .all(|e| e.code == ErrorCode::StructMissingField && e.message.starts_with("Required field missing: ")));
    let fields: Vec<_> = result
        .errors
        .iter()
        .map(|e| e.message.trim_start_matches("Required field missing: "))
        .collect();
    assert_eq!(fields, vec!["author", "created_at", "title"]);
}

#[test]
fn corrupted_sections_are_type_mismatches() {
    let mut doc = v02_document();
    doc["metadata"] = json!("should be object");
    doc["configurations"] = json!([]);
    doc["steps"] = json!("should be array");
    let result = pipeline().validate(&doc).unwrap();
    let mismatches = result
        .errors
        .iter()
        .filter(|e| e.code == ErrorCode::StructTypeMismatch)
        .count();
    assert!(mismatches >= 3);
}

#[test]
fn unknown_extension_keys_are_structural() {
    let mut doc = v02_document();
    doc["extensions"] = json!({"x-unknown": true});
    let result = pipeline().validate(&doc).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, ErrorCode::StructUnknownField);
    assert_eq!(result.errors[0].path, "extensions");
    assert_eq!(result.errors[0].message, "Unknown field 'x-unknown' is not allowed");
}

#[test]
fn nested_failures_are_all_enumerated() {
    let mut doc = v02_document();
    doc["steps"] = json!([
        {"name": "", "action": "Bad-Action", "parameters": [], "on_failure": "explode"},
        {"action": "ok", "parameters": {}, "retry_policy": {"max_attempts": 10, "extra": 1}},
        {"name": "c", "action": "ok", "parameters": {}, "conditions": [{"type": "maybe"}]},
        {"name": "d", "action": "ok", "parameters": {}, "timeout_override": 0}
    ]);
    let result = pipeline().validate(&doc).unwrap();
    assert!(result.errors.len() >= 10, "{:?}", result.errors);
    assert!(result.errors.iter().all(|e| e.code.is_structural()));
    assert!(result.errors.iter().any(|e| e.path == "steps[1].retry_policy.max_attempts"));
    assert!(result.errors.iter().any(|e| e.path == "steps[2].conditions[0]"));
}

#[test]
fn identical_input_gives_identical_output() {
    let pipeline = pipeline();
    let mut doc = v02_document();
    doc["metadata"]["id"] = json!(42);
    doc["configurations"]["max_retries"] = json!(99);
    doc["steps"][1]["unexpected"] = json!("x");
    let first = serde_json::to_string(&pipeline.validate(&doc).unwrap()).unwrap();
    for _ in 0..5 {
        let again = serde_json::to_string(&pipeline.validate(&doc).unwrap()).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn oversize_document_is_refused() {
    let limits = Limits {
        max_document_size: 512,
        ..Limits::default()
    };
    let registry = Arc::new(SchemaRegistry::open(repo_schemas()).unwrap());
    let pipeline = Pipeline::new(registry, limits).unwrap();
    let mut doc = v02_document();
    doc["metadata"]["description"] = json!("d".repeat(1024));
    assert!(matches!(
        pipeline.validate(&doc),
        Err(PipelineError::DocumentTooLarge { max: 512, .. })
    ));
}

#[test]
fn batch_reports_each_document() {
    let limits = Limits {
        max_document_size: 4096,
        ..Limits::default()
    };
    let registry = Arc::new(SchemaRegistry::open(repo_schemas()).unwrap());
    let pipeline = Pipeline::new(registry, limits).unwrap();

    let mut oversize = v02_document();
    oversize["metadata"]["description"] = json!("d".repeat(5000));
    let docs = vec![v02_document(), json!({"ksml_version": "0.9.0"}), oversize, v01_document()];

    let report = pipeline.validate_batch(&docs).unwrap();
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.summary.valid, 2);
    assert_eq!(report.summary.invalid, 1);
    assert_eq!(report.summary.errors, 1);
    assert_eq!(report.results[2].format_version, "unknown");
    assert_eq!(report.results[2].errors[0].code, ErrorCode::DocumentTooLarge);
    assert_eq!(report.results[2].errors[0].path, "root");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_long_string_is_reported(count in 1usize..8) {
        let long = "s".repeat(10_241);
        let mut doc = v02_document();
        let notes: Vec<Value> = (0..count).map(|_| json!(long)).collect();
        doc["steps"][0]["parameters"] = json!({ "notes": notes });
        let result = pipeline().validate(&doc).unwrap();
        prop_assert_eq!(result.errors.len(), count);
        for (i, error) in result.errors.iter().enumerate() {
            let expected = format!("steps[0].parameters.notes[{}]", i);
            prop_assert_eq!(&error.path, &expected);
        }
    }
}
