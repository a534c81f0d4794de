//! # Per-Client Rate Limiting
//!
//! Sliding-window admission gate keyed by client IP address.
//!
//! Each client owns a queue of admission timestamps behind its own mutex.
//! The outer map is write-locked only when a client is first seen and when
//! idle clients are swept, so concurrent requests from different clients
//! never wait on each other.
//!
//! Once more than [`SWEEP_THRESHOLD`] clients are on record, at most one
//! sweep per window drops every client with no admission left inside it.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ksml_core::RateLimitConfig;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;

/// Key used when the peer address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

/// Tracked-client count above which idle windows are swept.
pub const SWEEP_THRESHOLD: usize = 1024;

type Window = Arc<Mutex<VecDeque<Instant>>>;
type Windows = HashMap<String, Window>;

/// Shared rate limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<Windows>>,
    last_sweep: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
            last_sweep: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit a request from `key` now.
    pub fn admit(&self, key: &str) -> bool {
        self.admit_at(key, Instant::now())
    }

    /// Admit a request from `key` at `now`.
    ///
    /// Timestamps older than `now - window` are evicted first; the request
    /// is then recorded and admitted only if the client is under capacity.
    /// A refused request is not recorded.
    pub fn admit_at(&self, key: &str, now: Instant) -> bool {
        let admitted = {
            // The map stays read-locked so a sweep cannot orphan this window.
            let (_windows, window) = self.window_for(key);
            let mut stamps = window.lock();
            self.evict(&mut stamps, now);

            if stamps.len() < self.config.max_requests {
                stamps.push_back(now);
                true
            } else {
                false
            }
        };

        self.maybe_sweep(now);
        admitted
    }

    /// Number of clients with a window on record.
    pub fn tracked_clients(&self) -> usize {
        self.windows.read().len()
    }

    /// Drop every client with no admission inside the window ending at
    /// `now`. Returns the number of clients removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.write();
        let before = windows.len();
        windows.retain(|_, window| {
            let mut stamps = window.lock();
            self.evict(&mut stamps, now);
            !stamps.is_empty()
        });
        let removed = before - windows.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = windows.len(), "swept idle rate-limit windows");
        }
        removed
    }

    fn maybe_sweep(&self, now: Instant) {
        if self.tracked_clients() <= SWEEP_THRESHOLD {
            return;
        }
        {
            let mut last = self.last_sweep.lock();
            match *last {
                Some(at) if now.saturating_duration_since(at) < self.config.window => return,
                Some(_) => *last = Some(now),
                None => {
                    *last = Some(now);
                    return;
                }
            }
        }
        self.sweep_at(now);
    }

    fn evict(&self, stamps: &mut VecDeque<Instant>, now: Instant) {
        if let Some(cutoff) = now.checked_sub(self.config.window) {
            while stamps.front().is_some_and(|&t| t < cutoff) {
                stamps.pop_front();
            }
        }
    }

    fn window_for(&self, key: &str) -> (RwLockReadGuard<'_, Windows>, Window) {
        let windows = self.windows.read();
        let existing = windows.get(key).map(Arc::clone);
        if let Some(window) = existing {
            return (windows, window);
        }
        drop(windows);

        let mut windows = self.windows.write();
        let window = Arc::clone(windows.entry(key.to_string()).or_default());
        (RwLockWriteGuard::downgrade(windows), window)
    }
}

/// Client key for a request: the peer IP, or `"unknown"`.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware that enforces per-client rate limits.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let limiter = request.extensions().get::<RateLimiter>().cloned();

    if let Some(limiter) = limiter {
        let key = client_key(&request);
        if !limiter.admit(&key) {
            tracing::warn!(client = %key, "rate limit exceeded");
            if let Some(metrics) = request.extensions().get::<ApiMetrics>() {
                metrics.record_rate_limited();
            }
            let window_secs = limiter.config().window.as_secs();
            let mut response = AppError::RateLimited(format!(
                "more than {} requests in {window_secs}s",
                limiter.config().max_requests
            ))
            .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(window_secs));
            return response;
        }
    }

    next.run(request).await
}
