//! # Format Versions & Version Resolution
//!
//! A KSML document declares the schema generation it conforms to in its
//! `ksml_version` field. [`resolve_version`] classifies that declaration as
//! one of the supported [`FormatVersion`]s or rejects it with a specific,
//! deterministic [`VersionRejection`].
//!
//! Resolution is pure and total: it performs no I/O, holds no state, and
//! returns a definite answer for every JSON value, including non-strings.
//!
//! ## Rejection order
//!
//! 1. absent, `null`, or empty string: missing
//! 2. any other non-string: wrong type
//! 3. not exactly three dot-separated non-negative integers: malformed
//! 4. major other than 0: unsupported major
//! 5. minor above the newest supported minor: future version
//! 6. in range but not listed: unsupported version

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::path::json_type_name;

/// A supported document-format generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatVersion {
    /// `0.1.0`, the first published format.
    V0_1_0,
    /// `0.2.0`, adds dependencies, extensions, step policies, and the
    /// consumer-safety profile.
    V0_2_0,
}

impl FormatVersion {
    /// Every supported version, oldest first.
    pub const ALL: [FormatVersion; 2] = [Self::V0_1_0, Self::V0_2_0];

    /// The newest supported version; the default for schema requests.
    pub const NEWEST: FormatVersion = Self::V0_2_0;

    /// `major.minor.patch` rendering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0_1_0 => "0.1.0",
            Self::V0_2_0 => "0.2.0",
        }
    }

    /// `(major, minor, patch)` components.
    pub fn triple(&self) -> (u64, u64, u64) {
        match self {
            Self::V0_1_0 => (0, 1, 0),
            Self::V0_2_0 => (0, 2, 0),
        }
    }

    /// Short `v<major>.<minor>` alias used in schema URLs and routes.
    pub fn short_alias(&self) -> &'static str {
        match self {
            Self::V0_1_0 => "v0.1",
            Self::V0_2_0 => "v0.2",
        }
    }

    /// File name of the canonical schema inside the schema directory.
    pub fn schema_file_name(&self) -> &'static str {
        match self {
            Self::V0_1_0 => "ksml_schema_v0.1.json",
            Self::V0_2_0 => "ksml_schema_v0.2.json",
        }
    }

    /// Whether documents of this format must pass the Safety Guard before
    /// structural checking.
    pub fn requires_safety_profile(&self) -> bool {
        matches!(self, Self::V0_2_0)
    }

    /// Highest minor version among the supported set.
    pub fn max_supported_minor() -> u64 {
        Self::ALL.iter().map(|v| v.triple().1).max().unwrap_or(0)
    }

    /// Comma-separated list of supported versions.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Look up a version by exact string or by its short alias.
    pub fn from_alias(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s || v.short_alias() == s)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatVersion {
    type Err = VersionRejection;

    /// Strict parse: runs the full resolution rules on a string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_str(s)
    }
}

/// Why a declared version was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionRejection {
    #[error("Missing required field 'ksml_version'")]
    Missing,

    #[error("Invalid version type. Expected string, got {found}")]
    NotAString {
        /// JSON type of the declared value.
        found: &'static str,
    },

    #[error("Invalid version format '{value}'. Expected semantic version (x.y.z)")]
    Malformed { value: String },

    #[error("Unsupported major version {major}. Expected 0.x.x")]
    UnsupportedMajor { major: u64 },

    #[error("Future version {value}. Maximum supported: 0.{max_minor}.x")]
    FutureVersion { value: String, max_minor: u64 },

    #[error("Unsupported version {value}. Supported: {supported}")]
    Unsupported { value: String, supported: String },
}

/// Classify a declared `ksml_version` value.
///
/// `declared` is `None` when the field is absent from the document. Only
/// absence, `null`, and the empty string count as missing; every other
/// non-string value, including `0`, `false`, `[]` and `{}`, is a type error.
pub fn resolve_version(declared: Option<&Value>) -> Result<FormatVersion, VersionRejection> {
    match declared {
        None | Some(Value::Null) => Err(VersionRejection::Missing),
        Some(Value::String(s)) => resolve_str(s),
        Some(other) => Err(VersionRejection::NotAString {
            found: json_type_name(other),
        }),
    }
}

fn resolve_str(s: &str) -> Result<FormatVersion, VersionRejection> {
    if s.is_empty() {
        return Err(VersionRejection::Missing);
    }
    if let Some(version) = FormatVersion::ALL.into_iter().find(|v| v.as_str() == s) {
        return Ok(version);
    }

    let (major, minor, patch) = parse_triple(s).ok_or_else(|| VersionRejection::Malformed {
        value: s.to_string(),
    })?;

    if major != 0 {
        return Err(VersionRejection::UnsupportedMajor { major });
    }

    let max_minor = FormatVersion::max_supported_minor();
    if minor > max_minor {
        return Err(VersionRejection::FutureVersion {
            value: s.to_string(),
            max_minor,
        });
    }

    // Leading zeros ("0.02.0") parse to a listed triple but are not the
    // canonical spelling.
    match FormatVersion::ALL
        .into_iter()
        .find(|v| v.triple() == (major, minor, patch) && v.as_str() == s)
    {
        Some(version) => Ok(version),
        None => Err(VersionRejection::Unsupported {
            value: s.to_string(),
            supported: FormatVersion::supported_list(),
        }),
    }
}

/// Parse exactly three dot-separated runs of ASCII digits.
fn parse_triple(s: &str) -> Option<(u64, u64, u64)> {
    let mut parts = s.split('.');
    let mut next = || -> Option<u64> {
        let part = parts.next()?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    };
    let triple = (next()?, next()?, next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(triple)
}
