//! # Error Types
//!
//! Errors raised while assembling the validator's startup configuration.
//! Validation outcomes are never errors in this sense; they travel in
//! [`ValidationResult`](crate::ValidationResult).

use thiserror::Error;

/// Startup configuration could not be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An override was present but could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Name of the configuration key (environment variable).
        key: String,
        /// The raw value that was rejected.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
