//! Backend configuration
//!
//! A [`BackendConfig`] describes one remote service: which envelope to speak,
//! the credential, the model and the generation limits. Configs are built
//! once and never mutated afterwards; the `with_*` builders consume `self`.

use crate::error::Error;
use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default request timeout for every backend call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default maximum output tokens
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Remote service kinds, one adapter per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI Chat Completions API
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini generateContent API
    Gemini,
    /// Local Ollama server
    Local,
}

impl ServiceKind {
    /// All kinds in default pool order
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Anthropic,
        ServiceKind::OpenAi,
        ServiceKind::Gemini,
        ServiceKind::Local,
    ];

    /// Stable lowercase name, also used as the adapter name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Local => "local",
        }
    }

    /// Default model for this service
    #[must_use]
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => crate::anthropic::DEFAULT_MODEL,
            Self::OpenAi => crate::openai::DEFAULT_MODEL,
            Self::Gemini => crate::gemini::DEFAULT_MODEL,
            Self::Local => crate::local::DEFAULT_MODEL,
        }
    }

    /// Default API base URL for this service
    #[must_use]
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => crate::anthropic::DEFAULT_BASE_URL,
            Self::OpenAi => crate::openai::DEFAULT_BASE_URL,
            Self::Gemini => crate::gemini::DEFAULT_BASE_URL,
            Self::Local => crate::local::DEFAULT_BASE_URL,
        }
    }

    /// Environment variables that may carry the credential, in priority order
    #[must_use]
    pub fn credential_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Anthropic => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"],
            Self::OpenAi => &["OPENAI_API_KEY"],
            Self::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            // The local server needs an address rather than a key
            Self::Local => &["OLLAMA_BASE_URL", "OLLAMA_HOST"],
        }
    }

    fn env_prefix(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC",
            Self::OpenAi => "OPENAI",
            Self::Gemini => "GEMINI",
            Self::Local => "OLLAMA",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "gpt" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "local" | "ollama" => Ok(Self::Local),
            other => Err(Error::NotConfigured(format!("unknown service: {}", other))),
        }
    }
}

/// Configuration for a single backend adapter
#[derive(Clone)]
pub struct BackendConfig {
    kind: ServiceKind,
    api_key: String,
    model: String,
    base_url: Option<String>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackendConfig {
    /// Create a configuration with the service defaults
    #[must_use]
    pub fn new(kind: ServiceKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            model: kind.default_model().to_string(),
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Returns `None` when no credential for `kind` is present, which means
    /// the service is simply left out of the pool. `<PREFIX>_MODEL` and
    /// `<PREFIX>_BASE_URL` override the defaults.
    #[must_use]
    pub fn from_env(kind: ServiceKind) -> Option<Self> {
        let credential = kind
            .credential_vars()
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))?;

        let prefix = kind.env_prefix();
        let mut config = match kind {
            ServiceKind::Local => {
                let api_key = std::env::var("OLLAMA_API_KEY").unwrap_or_default();
                Self::new(kind, api_key).with_base_url(with_default_scheme(credential))
            }
            _ => Self::new(kind, credential),
        };

        if let Ok(model) = std::env::var(format!("{}_MODEL", prefix)) {
            config = config.with_model(model);
        }
        if kind != ServiceKind::Local {
            if let Ok(url) = std::env::var(format!("{}_BASE_URL", prefix)) {
                config = config.with_base_url(url);
            }
        }

        Some(config)
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API endpoint
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the maximum output tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Service kind
    #[must_use]
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Credential
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint override, if any
    #[must_use]
    pub fn endpoint_override(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Effective API base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
            .trim_end_matches('/')
    }

    /// Maximum output tokens
    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Sampling temperature
    #[must_use]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// `OLLAMA_HOST` is commonly a bare `host:port`
fn with_default_scheme(url: String) -> String {
    if url.contains("://") {
        url
    } else {
        format!("http://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BackendConfig::new(ServiceKind::Anthropic, "test-key")
            .with_model("claude-3-haiku-20240307")
            .with_max_tokens(2048)
            .with_temperature(0.2)
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.kind(), ServiceKind::Anthropic);
        assert_eq!(config.api_key(), "test-key");
        assert_eq!(config.model(), "claude-3-haiku-20240307");
        assert_eq!(config.max_tokens(), 2048);
        assert_eq!(config.temperature(), 0.2);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_defaults() {
        let config = BackendConfig::new(ServiceKind::OpenAi, "k");
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.endpoint_override(), None);
        assert_eq!(config.base_url(), "https://api.openai.com");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let config =
            BackendConfig::new(ServiceKind::Gemini, "k").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.endpoint_override(), Some("http://127.0.0.1:9000/"));
    }

    #[test]
    fn test_local_host_without_scheme() {
        assert_eq!(
            with_default_scheme("127.0.0.1:11434".to_string()),
            "http://127.0.0.1:11434"
        );
        assert_eq!(
            with_default_scheme("https://ollama.internal".to_string()),
            "https://ollama.internal"
        );

        std::env::remove_var("OLLAMA_BASE_URL");
        std::env::set_var("OLLAMA_HOST", "0.0.0.0:11434");
        let config = BackendConfig::from_env(ServiceKind::Local).unwrap();
        std::env::remove_var("OLLAMA_HOST");

        assert_eq!(config.base_url(), "http://0.0.0.0:11434");
        assert!(BackendConfig::from_env(ServiceKind::Local).is_none());
    }

    #[test]
    fn test_service_kind_parse() {
        assert_eq!("Claude".parse::<ServiceKind>().unwrap(), ServiceKind::Anthropic);
        assert_eq!("openai".parse::<ServiceKind>().unwrap(), ServiceKind::OpenAi);
        assert_eq!("google".parse::<ServiceKind>().unwrap(), ServiceKind::Gemini);
        assert_eq!("ollama".parse::<ServiceKind>().unwrap(), ServiceKind::Local);
        assert!("mystery".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = BackendConfig::new(ServiceKind::Anthropic, "sk-ant-REDACTED");
        let debug_str = format!("{:?}", config);

        assert!(!debug_str.contains("1234567890"));
        assert!(debug_str.contains("sk-a...ghij"));
    }
}
