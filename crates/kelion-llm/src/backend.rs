//! Backend trait and the closed set of adapters
//!
//! Each remote service gets one adapter that translates the uniform
//! `(system, conversation)` shape into its native envelope. [`Adapter`] is
//! the closed enum the pool holds in production; the [`Backend`] trait is
//! the seam tests use to inject scripted backends.

use crate::anthropic::AnthropicBackend;
use crate::config::{BackendConfig, ServiceKind};
use crate::error::Result;
use crate::gemini::GeminiBackend;
use crate::local::LocalBackend;
use crate::message::Message;
use crate::openai::OpenAiBackend;

/// Trait for AI backends
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Backend name, reported as the backend that served a request
    fn name(&self) -> &str;

    /// Service kind
    fn kind(&self) -> ServiceKind;

    /// Generate a reply for `conversation` under `system` instructions
    ///
    /// Fails with [`Error::RateLimited`](crate::Error::RateLimited) on HTTP 429
    /// and [`Error::Backend`](crate::Error::Backend) on any other failure.
    async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String>;
}

/// One adapter per remote service
#[derive(Debug)]
pub enum Adapter {
    /// Anthropic Messages API
    Anthropic(AnthropicBackend),
    /// OpenAI Chat Completions API
    OpenAi(OpenAiBackend),
    /// Google Gemini API
    Gemini(GeminiBackend),
    /// Local Ollama server
    Local(LocalBackend),
}

impl Adapter {
    /// Build the adapter matching `config.kind()`
    pub fn from_config(config: BackendConfig) -> Result<Self> {
        Ok(match config.kind() {
            ServiceKind::Anthropic => Self::Anthropic(AnthropicBackend::new(config)?),
            ServiceKind::OpenAi => Self::OpenAi(OpenAiBackend::new(config)?),
            ServiceKind::Gemini => Self::Gemini(GeminiBackend::new(config)?),
            ServiceKind::Local => Self::Local(LocalBackend::new(config)?),
        })
    }

    /// Configuration the adapter was built from
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        match self {
            Self::Anthropic(b) => b.config(),
            Self::OpenAi(b) => b.config(),
            Self::Gemini(b) => b.config(),
            Self::Local(b) => b.config(),
        }
    }
}

#[async_trait::async_trait]
impl Backend for Adapter {
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    fn kind(&self) -> ServiceKind {
        self.config().kind()
    }

    async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String> {
        match self {
            Self::Anthropic(b) => b.generate(system, conversation).await,
            Self::OpenAi(b) => b.generate(system, conversation).await,
            Self::Gemini(b) => b.generate(system, conversation).await,
            Self::Local(b) => b.generate(system, conversation).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_variant() {
        for kind in ServiceKind::ALL {
            let adapter = Adapter::from_config(BackendConfig::new(kind, "test-key-123456")).unwrap();
            assert_eq!(adapter.kind(), kind);
            assert_eq!(adapter.name(), kind.as_str());
        }

        let adapter =
            Adapter::from_config(BackendConfig::new(ServiceKind::Gemini, "test-key-123456")).unwrap();
        assert!(matches!(adapter, Adapter::Gemini(_)));
    }
}
