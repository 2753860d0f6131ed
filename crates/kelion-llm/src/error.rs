//! Error types for kelion-llm

use std::fmt;
use thiserror::Error;

/// Failure code attached to a [`Error::Backend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCode {
    /// Non-2xx HTTP status (other than 429)
    Status(u16),
    /// Request exceeded the configured timeout
    Timeout,
    /// Could not connect to the service
    Connect,
    /// Any other transport failure
    Transport,
    /// Response body could not be decoded
    Decode,
}

impl BackendCode {
    /// HTTP status code, if the failure came from a response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for BackendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => f.write_str("timeout"),
            Self::Connect => f.write_str("connect"),
            Self::Transport => f.write_str("transport"),
            Self::Decode => f.write_str("decode"),
        }
    }
}

/// One backend's failure inside a fallback round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Backend name
    pub backend: String,
    /// Rendered error
    pub error: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// LLM error type
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Service-reported throttling (HTTP 429)
    #[error("rate limited")]
    RateLimited,

    /// Non-2xx response or transport failure
    #[error("backend error ({code}): {message}")]
    Backend {
        /// Failure code
        code: BackendCode,
        /// Sanitized detail
        message: String,
    },

    /// The pool holds no backends
    #[error("no providers available in pool")]
    NoProviders,

    /// Every backend in the pool failed for one request
    #[error("all providers failed: {}", join_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    /// Backend not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl Error {
    /// Shorthand for a backend failure
    pub fn backend(code: BackendCode, message: impl Into<String>) -> Self {
        Self::Backend {
            code,
            message: message.into(),
        }
    }

    /// Whether the pool should try the next backend after this error
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Backend { .. })
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
