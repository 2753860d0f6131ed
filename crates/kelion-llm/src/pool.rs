//! Backend pool - round-robin distribution with fallback
//!
//! The pool owns an ordered list of backends and a rotation cursor. The
//! cursor is the only state shared by concurrent workers; it sits behind a
//! mutex so no two callers observe the same value before it advances.
//! A fallback call claims one cursor slot and walks the pool from there, so
//! concurrent callers cannot push it onto a backend it already tried.

use crate::backend::{Adapter, Backend};
use crate::config::BackendConfig;
use crate::error::{Error, ProviderFailure, Result};
use crate::message::Message;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Text produced by the pool and the backend that served it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Raw model response
    pub content: String,
    /// Name of the backend that produced it
    pub backend: String,
}

/// Ordered pool of backends with a shared round-robin cursor
pub struct BackendPool<B: Backend = Adapter> {
    backends: Vec<B>,
    /// Always in `[0, len)` while the pool is non-empty
    cursor: Mutex<usize>,
}

impl<B: Backend> Default for BackendPool<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for BackendPool<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendPool")
            .field("backends", &self.names())
            .finish()
    }
}

impl BackendPool<Adapter> {
    /// Build a pool from configurations, preserving their order
    pub fn from_configs(configs: impl IntoIterator<Item = BackendConfig>) -> Result<Self> {
        let mut pool = Self::new();
        for config in configs {
            debug!(config = ?config, "Adding backend");
            pool.add(Adapter::from_config(config)?);
        }
        info!(backends = ?pool.names(), "Backend pool ready");
        Ok(pool)
    }
}

impl<B: Backend> BackendPool<B> {
    /// Create an empty pool
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            cursor: Mutex::new(0),
        }
    }

    /// Append a backend (no dedup)
    pub fn add(&mut self, backend: B) {
        self.backends.push(backend);
    }

    /// Append a backend, builder style
    #[must_use]
    pub fn with_backend(mut self, backend: B) -> Self {
        self.add(backend);
        self
    }

    /// Number of backends
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the pool is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backends in pool order
    #[must_use]
    pub fn backends(&self) -> &[B] {
        &self.backends
    }

    /// Backend names in pool order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Return the backend under the cursor and advance it
    pub fn next_backend(&self) -> Result<&B> {
        if self.backends.is_empty() {
            return Err(Error::NoProviders);
        }

        Ok(&self.backends[self.claim_slot()])
    }

    /// Take the cursor value and advance it by one; pool must be non-empty
    fn claim_slot(&self) -> usize {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let index = *cursor;
        *cursor = (index + 1) % self.backends.len();
        index
    }

    /// Generate with the next backend, falling back through the rest
    ///
    /// Claims one cursor slot, then tries at most `len()` backends starting
    /// there, each exactly once. Per-backend failures are collected and
    /// returned together if every backend fails.
    #[instrument(skip_all, fields(pool_size = self.backends.len()))]
    pub async fn generate_with_fallback(
        &self,
        system: &str,
        conversation: &[Message],
    ) -> Result<Generation> {
        if self.backends.is_empty() {
            return Err(Error::NoProviders);
        }

        let len = self.backends.len();
        let start = self.claim_slot();
        let mut failures = Vec::new();

        for attempt in 0..len {
            let backend = &self.backends[(start + attempt) % len];
            debug!(backend = backend.name(), attempt, "Dispatching to backend");

            match backend.generate(system, conversation).await {
                Ok(content) => {
                    if attempt > 0 {
                        info!(backend = backend.name(), attempt, "Fallback succeeded");
                    }
                    return Ok(Generation {
                        content,
                        backend: backend.name().to_string(),
                    });
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(backend = backend.name(), error = %e, "Backend failed, trying next");
                    } else {
                        error!(backend = backend.name(), error = %e, "Backend failed unexpectedly");
                    }
                    failures.push(ProviderFailure {
                        backend: backend.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(Error::AllProvidersFailed(failures))
    }
}
