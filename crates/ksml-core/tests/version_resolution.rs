//! Property tests: version resolution is total and deterministic.
//!
//! Every JSON value, of every shape, must produce a definite accept or a
//! typed rejection, and the same input must always produce the same answer.

use ksml_core::{resolve_version, FormatVersion, VersionRejection};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| json!(f)),
        ".*".prop_map(Value::String),
        "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn resolution_is_total_and_deterministic(value in arb_json()) {
        let first = resolve_version(Some(&value));
        let second = resolve_version(Some(&value));
        prop_assert_eq!(&first, &second);

        if let Ok(version) = first {
            prop_assert_eq!(value, Value::String(version.as_str().to_string()));
        }
    }

    #[test]
    fn well_formed_triples_never_report_malformed(
        major in 0u64..1000,
        minor in 0u64..1000,
        patch in 0u64..1000,
    ) {
        let declared = Value::String(format!("{major}.{minor}.{patch}"));
        match resolve_version(Some(&declared)) {
            Ok(version) => prop_assert_eq!(version.triple(), (major, minor, patch)),
            Err(VersionRejection::UnsupportedMajor { major: m }) => {
                prop_assert!(major != 0);
                prop_assert_eq!(m, major);
            }
            Err(VersionRejection::FutureVersion { max_minor, .. }) => {
                prop_assert_eq!(major, 0);
                prop_assert!(minor > max_minor);
            }
            Err(VersionRejection::Unsupported { .. }) => {
                prop_assert_eq!(major, 0);
                prop_assert!(minor <= FormatVersion::max_supported_minor());
            }
            Err(other) => prop_assert!(false, "unexpected rejection {other:?}"),
        }
    }

    #[test]
    fn non_string_values_never_resolve(n in any::<i64>()) {
        let err = resolve_version(Some(&json!(n))).unwrap_err();
        prop_assert_eq!(err, VersionRejection::NotAString { found: "integer" });
    }
}
