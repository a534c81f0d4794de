//! # Schema Registry
//!
//! Maps each [`FormatVersion`] to its canonical schema file and keeps a
//! compiled validator for it in memory.
//!
//! ## Cache discipline
//!
//! Entries are keyed by format version and carry the path and modification
//! time of the file they were built from. Every [`SchemaRegistry::load`]
//! stats the file; when the path or modification time differs from the
//! cached entry, the file is re-read, recompiled, and replaces the stale
//! entry. A file removed after caching is reported as not found rather
//! than served from the cache.
//!
//! The cache is shared across request handlers behind a
//! [`parking_lot::RwLock`]. Readers only hold the lock to clone an `Arc`;
//! file I/O and compilation happen outside the lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use jsonschema::Validator;
use ksml_core::FormatVersion;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while locating, reading, or compiling a schema.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// No schema file exists for the version.
    #[error("schema for version {version} not found at {}", path.display())]
    NotFound {
        version: FormatVersion,
        path: PathBuf,
    },

    /// The schema file exists but could not be read.
    #[error("failed to read schema {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("schema {} is not valid JSON: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The schema parsed but could not be compiled into a validator.
    #[error("failed to compile schema {}: {reason}", path.display())]
    Compile { path: PathBuf, reason: String },
}

/// A parsed and compiled schema, tagged with the file state it came from.
pub struct LoadedSchema {
    version: FormatVersion,
    path: PathBuf,
    modified: SystemTime,
    document: Value,
    validator: Validator,
}

impl std::fmt::Debug for LoadedSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedSchema")
            .field("version", &self.version)
            .field("path", &self.path)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl LoadedSchema {
    fn read(version: FormatVersion, path: PathBuf, modified: SystemTime) -> Result<Self, SchemaLoadError> {
        let content = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SchemaLoadError::NotFound {
                version,
                path: path.clone(),
            },
            _ => SchemaLoadError::Io {
                path: path.clone(),
                source,
            },
        })?;

        let document: Value =
            serde_json::from_str(&content).map_err(|source| SchemaLoadError::InvalidJson {
                path: path.clone(),
                source,
            })?;

        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .should_validate_formats(true)
            .build(&document)
            .map_err(|e| SchemaLoadError::Compile {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            version,
            path,
            modified,
            document,
            validator,
        })
    }

    /// The format version this schema describes.
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// File the schema was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the file when it was read.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// The raw schema document, as published.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The schema's `$id`, if it declares one.
    pub fn id(&self) -> Option<&str> {
        self.document.get("$id").and_then(Value::as_str)
    }

    /// The compiled validator.
    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}

/// Version-keyed cache of compiled schemas backed by a directory of files.
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    cache: RwLock<HashMap<FormatVersion, Arc<LoadedSchema>>>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schema_dir", &self.schema_dir)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl SchemaRegistry {
    /// Create an empty registry over `schema_dir`. Nothing is read until
    /// the first lookup or [`preload_all`](Self::preload_all).
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry and eagerly load every supported version.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaLoadError`] encountered.
    pub fn open(schema_dir: impl Into<PathBuf>) -> Result<Self, SchemaLoadError> {
        let registry = Self::new(schema_dir);
        registry.preload_all()?;
        Ok(registry)
    }

    /// Load every supported version into the cache.
    pub fn preload_all(&self) -> Result<(), SchemaLoadError> {
        for version in FormatVersion::ALL {
            self.load(version)?;
        }
        tracing::info!(
            schema_dir = %self.schema_dir.display(),
            count = FormatVersion::ALL.len(),
            "schemas preloaded"
        );
        Ok(())
    }

    /// Directory the schemas are read from.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Location of the schema file for `version`.
    pub fn path_for(&self, version: FormatVersion) -> PathBuf {
        self.schema_dir.join(version.schema_file_name())
    }

    /// Versions currently held in the cache, oldest first.
    pub fn cached_versions(&self) -> Vec<FormatVersion> {
        let mut versions: Vec<_> = self.cache.read().keys().copied().collect();
        versions.sort();
        versions
    }

    /// Return the compiled schema for `version`, reloading it when the
    /// file on disk no longer matches the cached entry.
    ///
    /// # Errors
    ///
    /// [`SchemaLoadError::NotFound`] when the file is absent; the other
    /// variants when it cannot be read, parsed, or compiled. A failed reload
    /// leaves the previous entry in place.
    pub fn load(&self, version: FormatVersion) -> Result<Arc<LoadedSchema>, SchemaLoadError> {
        let path = self.path_for(version);
        let modified = freshness_token(version, &path)?;

        if let Some(entry) = self.cache.read().get(&version) {
            if entry.path == path && entry.modified == modified {
                return Ok(Arc::clone(entry));
            }
        }

        let loaded = Arc::new(LoadedSchema::read(version, path, modified)?);
        let replaced = self
            .cache
            .write()
            .insert(version, Arc::clone(&loaded))
            .is_some();

        if replaced {
            tracing::info!(version = %version, path = %loaded.path.display(), "stale schema replaced");
        } else {
            tracing::debug!(version = %version, path = %loaded.path.display(), "schema cached");
        }
        Ok(loaded)
    }
}

/// Modification time of the schema file, mapping absence to `NotFound`.
fn freshness_token(version: FormatVersion, path: &Path) -> Result<SystemTime, SchemaLoadError> {
    let io_error = |source: std::io::Error| match source.kind() {
        std::io::ErrorKind::NotFound => SchemaLoadError::NotFound {
            version,
            path: path.to_path_buf(),
        },
        _ => SchemaLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    };
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(io_error)
}
