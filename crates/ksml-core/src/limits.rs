//! # Limits — Startup Configuration Constants
//!
//! Every externally observable size or rate limit of the validator lives
//! here. Defaults match the published consumer-safety profile; each value
//! may be overridden once at startup from the environment and is never
//! mutated afterwards.
//!
//! Overrides are read through a lookup closure so tests can supply a
//! fixed map instead of touching the process environment.

use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

/// Resource limits enforced by the pipeline and the Safety Guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    /// Maximum serialized document size in bytes.
    pub max_document_size: usize,
    /// Maximum number of entries in the top-level `steps` sequence.
    pub max_steps: usize,
    /// Maximum number of entries in `metadata.dependencies`.
    pub max_dependencies: usize,
    /// Maximum container nesting depth (root is depth 0).
    pub max_nesting_depth: usize,
    /// Maximum length of any string node, in characters.
    pub max_string_length: usize,
    /// Maximum number of elements in any sequence node.
    pub max_array_size: usize,
    /// Maximum number of keys in any mapping node.
    pub max_object_keys: usize,
    /// Maximum number of documents accepted in one batch.
    pub max_batch_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_document_size: 1024 * 1024,
            max_steps: 100,
            max_dependencies: 50,
            max_nesting_depth: 10,
            max_string_length: 10 * 1024,
            max_array_size: 1000,
            max_object_keys: 100,
            max_batch_size: 10,
        }
    }
}

impl Limits {
    /// Build limits from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if any `KSML_MAX_*` variable is
    /// set but is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build limits from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            max_document_size: read_positive(&lookup, "KSML_MAX_DOCUMENT_SIZE", d.max_document_size)?,
            max_steps: read_positive(&lookup, "KSML_MAX_STEPS", d.max_steps)?,
            max_dependencies: read_positive(&lookup, "KSML_MAX_DEPENDENCIES", d.max_dependencies)?,
            max_nesting_depth: read_positive(&lookup, "KSML_MAX_NESTING_DEPTH", d.max_nesting_depth)?,
            max_string_length: read_positive(&lookup, "KSML_MAX_STRING_LENGTH", d.max_string_length)?,
            max_array_size: read_positive(&lookup, "KSML_MAX_ARRAY_SIZE", d.max_array_size)?,
            max_object_keys: read_positive(&lookup, "KSML_MAX_OBJECT_KEYS", d.max_object_keys)?,
            max_batch_size: read_positive(&lookup, "KSML_MAX_BATCH_SIZE", d.max_batch_size)?,
        })
    }
}

/// Sliding-window admission limits for the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum admissions per client inside one window.
    pub max_requests: usize,
    /// Length of the trailing window.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Build the rate limit from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the rate limit from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let window_secs = read_positive(&lookup, "KSML_RATE_LIMIT_WINDOW_SECS", d.window.as_secs() as usize)?;
        Ok(Self {
            max_requests: read_positive(&lookup, "KSML_RATE_LIMIT_REQUESTS", d.max_requests)?,
            window: Duration::from_secs(window_secs as u64),
        })
    }
}

fn read_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let parsed: usize = raw
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, &raw, format!("{e}")))?;
    if parsed == 0 {
        return Err(ConfigError::invalid(key, &raw, "must be greater than zero"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_safety_profile() {
        let limits = Limits::default();
        assert_eq!(limits.max_document_size, 1_048_576);
        assert_eq!(limits.max_steps, 100);
        assert_eq!(limits.max_dependencies, 50);
        assert_eq!(limits.max_nesting_depth, 10);
        assert_eq!(limits.max_string_length, 10_240);
        assert_eq!(limits.max_array_size, 1000);
        assert_eq!(limits.max_object_keys, 100);
        assert_eq!(limits.max_batch_size, 10);
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let limits = Limits::from_lookup(|_| None).unwrap();
        assert_eq!(limits, Limits::default());
        let rate = RateLimitConfig::from_lookup(|_| None).unwrap();
        assert_eq!(rate, RateLimitConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let limits = Limits::from_lookup(lookup_from(&[
            ("KSML_MAX_STEPS", "5"),
            ("KSML_MAX_NESTING_DEPTH", " 3 "),
        ]))
        .unwrap();
        assert_eq!(limits.max_steps, 5);
        assert_eq!(limits.max_nesting_depth, 3);
        assert_eq!(limits.max_dependencies, 50);
    }

    #[test]
    fn rate_limit_overrides_are_applied() {
        let rate = RateLimitConfig::from_lookup(lookup_from(&[
            ("KSML_RATE_LIMIT_REQUESTS", "2"),
            ("KSML_RATE_LIMIT_WINDOW_SECS", "1"),
        ]))
        .unwrap();
        assert_eq!(rate.max_requests, 2);
        assert_eq!(rate.window, Duration::from_secs(1));
    }

    #[test]
    fn malformed_override_is_rejected() {
        let err = Limits::from_lookup(lookup_from(&[("KSML_MAX_STEPS", "many")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "KSML_MAX_STEPS");
                assert_eq!(value, "many");
            }
        }
    }

    #[test]
    fn zero_override_is_rejected() {
        let err =
            RateLimitConfig::from_lookup(lookup_from(&[("KSML_RATE_LIMIT_REQUESTS", "0")]))
                .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
