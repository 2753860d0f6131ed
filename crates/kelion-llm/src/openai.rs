//! OpenAI - Chat Completions adapter
//!
//! The system prompt travels as the first entry of the unified message list.

use crate::config::BackendConfig;
use crate::error::{BackendCode, Error, Result};
use crate::http::{build_client, decode, map_send_error, read_body};
use crate::message::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

// OpenAI-compatible request/response types
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI adapter
#[derive(Debug)]
pub struct OpenAiBackend {
    client: Client,
    config: BackendConfig,
}

impl OpenAiBackend {
    /// Create a new OpenAI adapter
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = build_client(config.timeout())?;
        Ok(Self { client, config })
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn build_request<'a>(&'a self, system: &'a str, conversation: &'a [Message]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
        messages.extend(conversation.iter().map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        }));

        ChatRequest {
            model: self.config.model(),
            max_tokens: self.config.max_tokens(),
            temperature: self.config.temperature(),
            messages,
        }
    }

    /// Send one request and extract the text payload
    #[instrument(skip_all, fields(backend = "openai", model = %self.config.model()))]
    pub async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String> {
        debug!("Sending request to OpenAI");

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url()))
            .bearer_auth(self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&self.build_request(system, conversation))
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_body(response).await?;
        let response: ChatResponse = decode(&body)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::backend(BackendCode::Decode, "No choices in response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceKind;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn backend(url: &str) -> OpenAiBackend {
        let config = BackendConfig::new(ServiceKind::OpenAi, "sk-test-openai").with_base_url(url);
        OpenAiBackend::new(config).unwrap()
    }

    #[test]
    fn test_system_prompt_is_first_message() {
        let backend = backend("http://localhost");
        let conversation = vec![Message::user("Hello")];
        let value = serde_json::to_value(backend.build_request("You are helpful", &conversation)).unwrap();

        assert_eq!(value["messages"][0], json!({"role": "system", "content": "You are helpful"}));
        assert_eq!(value["messages"][1], json!({"role": "user", "content": "Hello"}));
        assert_eq!(value["model"], DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_generate_extracts_first_choice() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test-openai")
            .match_body(Matcher::PartialJson(json!({"messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "hi"}]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
            .create_async()
            .await;

        let text = backend(&server.url())
            .generate("sys", &[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_empty_choices_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = backend(&server.url())
            .generate("sys", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                code: BackendCode::Decode,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_is_sanitized() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided: sk-test-openai"}}"#)
            .create_async()
            .await;

        let err = backend(&server.url())
            .generate("sys", &[Message::user("hi")])
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("HTTP 401"));
        assert!(!msg.contains("sk-test-openai"));
    }
}
