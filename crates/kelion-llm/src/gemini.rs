//! Gemini - Google Gemini API adapter
//!
//! Gemini takes no system field here. The instructions are injected as a
//! synthetic user/model turn pair ahead of the conversation, and every
//! non-user role is spoken as `model`.

use crate::config::BackendConfig;
use crate::error::{BackendCode, Error, Result};
use crate::http::{build_client, decode, map_send_error, read_body};
use crate::message::{Message, MessageRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model turn acknowledging the injected instructions
const ACKNOWLEDGEMENT: &str = "Understood. I will follow these instructions.";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiContent {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![GeminiPart {
                text: Some(text.into()),
            }],
        }
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Google Gemini adapter
#[derive(Debug)]
pub struct GeminiBackend {
    client: Client,
    config: BackendConfig,
}

impl GeminiBackend {
    /// Create a new Gemini adapter
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = build_client(config.timeout())?;
        Ok(Self { client, config })
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Convert the uniform conversation, prepending the instruction turn pair
    fn convert_messages(system: &str, conversation: &[Message]) -> Vec<GeminiContent> {
        let mut contents = Vec::with_capacity(conversation.len() + 2);
        contents.push(GeminiContent::text("user", format!("System: {}", system)));
        contents.push(GeminiContent::text("model", ACKNOWLEDGEMENT));

        for msg in conversation {
            let role = match msg.role {
                MessageRole::User => "user",
                _ => "model",
            };
            contents.push(GeminiContent::text(role, msg.content.clone()));
        }
        contents
    }

    fn build_request(&self, system: &str, conversation: &[Message]) -> GeminiRequest {
        GeminiRequest {
            contents: Self::convert_messages(system, conversation),
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_tokens(),
                temperature: self.config.temperature(),
            },
        }
    }

    /// Send one request and extract the text payload
    #[instrument(skip_all, fields(backend = "gemini", model = %self.config.model()))]
    pub async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String> {
        // Key goes in the query string; map_send_error strips URLs from errors
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        );
        debug!("Sending request to Gemini: {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key())])
            .header("Content-Type", "application/json")
            .json(&self.build_request(system, conversation))
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_body(response).await?;
        let response: GeminiResponse = decode(&body)?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::backend(BackendCode::Decode, "No candidates in response"));
        }
        Ok(text)
    }
}
