//! Anthropic - Claude API adapter
//!
//! The Messages API takes the system prompt as a top-level `system` field
//! next to a role-tagged message list.

use crate::config::BackendConfig;
use crate::error::{BackendCode, Error, Result};
use crate::http::{build_client, decode, map_send_error, read_body};
use crate::message::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Anthropic API version
const API_VERSION: &str = "2023-06-01";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

// ============================================================================
// Adapter
// ============================================================================

/// Anthropic Claude adapter
#[derive(Debug)]
pub struct AnthropicBackend {
    client: Client,
    config: BackendConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic adapter
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = build_client(config.timeout())?;
        Ok(Self { client, config })
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn build_request<'a>(&'a self, system: &'a str, conversation: &'a [Message]) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: self.config.model(),
            max_tokens: self.config.max_tokens(),
            temperature: self.config.temperature(),
            system,
            messages: conversation
                .iter()
                .map(|msg| AnthropicMessage {
                    role: msg.role.as_str(),
                    content: &msg.content,
                })
                .collect(),
        }
    }

    /// Send one request and extract the text payload
    #[instrument(skip_all, fields(backend = "anthropic", model = %self.config.model()))]
    pub async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url());
        debug!("Sending request to Anthropic: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request(system, conversation))
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_body(response).await?;
        let response: AnthropicResponse = decode(&body)?;

        let text = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text),
                ResponseContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::backend(BackendCode::Decode, "response contained no text"));
        }
        Ok(text)
    }
}
