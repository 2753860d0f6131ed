//! Mock backend for testing
//!
//! Scripted backends that record how they were called. Used by the pool
//! tests here and by the orchestrator tests downstream.

use crate::backend::Backend;
use crate::config::ServiceKind;
use crate::error::{Error, Result};
use crate::message::Message;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&str, &[Message]) -> Result<String> + Send + Sync;

/// A scripted backend
pub struct MockBackend {
    name: String,
    responder: Box<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("name", &self.name)
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockBackend {
    /// Backend whose reply is computed from the request
    pub fn from_fn<F>(name: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&str, &[Message]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend that always answers `text`
    pub fn replying(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(name, move |_, _| Ok(text.clone()))
    }

    /// Backend that always fails with `error`
    pub fn failing(name: impl Into<String>, error: Error) -> Self {
        Self::from_fn(name, move |_, _| Err(error.clone()))
    }

    /// Sleep before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `generate` calls observed
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Last user message of every request, in arrival order
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Local
    }

    async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(last) = conversation.last() {
            self.prompts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(last.content.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(system, conversation)
    }
}
