//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Everything here is built once at startup;
//! the only interior mutability is the schema cache (inside the
//! pipeline's registry), the rate-limit windows, and the metric counters.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ksml_core::{ConfigError, Limits, RateLimitConfig};
use ksml_schema::{SchemaLoadError, SchemaRegistry};
use ksml_validator::{Pipeline, PipelineError};
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimiter;

/// Server configuration, read from the environment at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding the canonical schema files.
    pub schema_dir: PathBuf,
    /// API key for bearer authentication. `None` disables auth.
    pub api_key: Option<String>,
    /// Emit JSON-formatted logs.
    pub log_json: bool,
    pub limits: Limits,
    pub rate_limit: RateLimitConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("schema_dir", &self.schema_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("log_json", &self.log_json)
            .field("limits", &self.limits)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            schema_dir: PathBuf::from("schemas"),
            api_key: None,
            log_json: false,
            limits: Limits::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Reads `PORT`, `KSML_SCHEMA_DIR`, `KSML_API_KEY`, `KSML_LOG_JSON`,
    /// and every limit override understood by [`Limits`] and
    /// [`RateLimitConfig`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &raw, format!("{e}")))?,
            None => defaults.port,
        };

        let schema_dir = lookup("KSML_SCHEMA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.schema_dir);

        let api_key = lookup("KSML_API_KEY").filter(|key| !key.is_empty());

        let log_json = lookup("KSML_LOG_JSON")
            .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            port,
            schema_dir,
            api_key,
            log_json,
            limits: Limits::from_lookup(&lookup)?,
            rate_limit: RateLimitConfig::from_lookup(&lookup)?,
        })
    }
}

/// Failure while assembling [`AppState`].
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("schema preload failed: {0}")]
    Schema(#[from] SchemaLoadError),

    #[error("pipeline construction failed: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<Pipeline>,
    pub metrics: ApiMetrics,
    pub limiter: RateLimiter,
    pub started_at: DateTime<Utc>,
    started: Instant,
    prometheus: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("started_at", &self.started_at)
            .field("prometheus", &self.prometheus.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Preload every schema and assemble the pipeline.
    ///
    /// # Errors
    ///
    /// [`StartupError::Schema`] when any supported version's schema cannot
    /// be loaded; the server must not start in that case.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        let registry = Arc::new(SchemaRegistry::open(&config.schema_dir)?);
        let pipeline = Arc::new(Pipeline::new(registry, config.limits)?);
        let limiter = RateLimiter::new(config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            pipeline,
            metrics: ApiMetrics::new(),
            limiter,
            started_at: Utc::now(),
            started: Instant::now(),
            prometheus: None,
        })
    }

    /// Attach the handle of an installed Prometheus recorder.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            api_key: self.config.api_key.clone(),
        }
    }

    pub fn prometheus(&self) -> Option<&PrometheusHandle> {
        self.prometheus.as_ref()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
