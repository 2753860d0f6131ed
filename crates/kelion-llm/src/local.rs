//! Local - Ollama chat adapter
//!
//! Talks to a local Ollama server through `/api/chat` with streaming off.
//! The system prompt is the first chat message. A credential is optional and
//! only sent when configured (for authenticating reverse proxies).

use crate::config::BackendConfig;
use crate::error::{BackendCode, Error, Result};
use crate::http::{build_client, decode, map_send_error, read_body};
use crate::message::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default Ollama model
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Default Ollama API URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Ollama local adapter
#[derive(Debug)]
pub struct LocalBackend {
    client: Client,
    config: BackendConfig,
}

impl LocalBackend {
    /// Create a new local adapter
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = build_client(config.timeout())?;
        Ok(Self { client, config })
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn build_request<'a>(&'a self, system: &'a str, conversation: &'a [Message]) -> OllamaChatRequest<'a> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(OllamaMessage {
            role: "system",
            content: system,
        });
        messages.extend(conversation.iter().map(|msg| OllamaMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        }));

        OllamaChatRequest {
            model: self.config.model(),
            messages,
            options: OllamaOptions {
                temperature: self.config.temperature(),
                num_predict: self.config.max_tokens(),
            },
            stream: false,
        }
    }

    /// Send one request and extract the text payload
    #[instrument(skip_all, fields(backend = "local", model = %self.config.model()))]
    pub async fn generate(&self, system: &str, conversation: &[Message]) -> Result<String> {
        let url = format!("{}/api/chat", self.config.base_url());
        debug!("Sending request to Ollama: {}", url);

        let mut request = self
            .client
            .post(&url)
            .json(&self.build_request(system, conversation));
        if !self.config.api_key().is_empty() {
            request = request.bearer_auth(self.config.api_key());
        }

        let response = request.send().await.map_err(map_send_error)?;
        let body = read_body(response).await?;
        let response: OllamaChatResponse = decode(&body)?;

        if response.message.content.is_empty() {
            return Err(Error::backend(BackendCode::Decode, "empty response from model"));
        }
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceKind;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn backend(url: &str) -> LocalBackend {
        let config = BackendConfig::new(ServiceKind::Local, "").with_base_url(url);
        LocalBackend::new(config).unwrap()
    }

    #[test]
    fn test_default_base_url() {
        let config = BackendConfig::new(ServiceKind::Local, "");
        assert_eq!(config.base_url(), "http://localhost:11434");
        assert_eq!(config.model(), "llama3.2");
    }

    #[tokio::test]
    async fn test_generate_non_streaming() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(json!({
                "stream": false,
                "messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "hi"}]
            })))
            .with_status(200)
            .with_body(r#"{"model":"llama3.2","message":{"role":"assistant","content":"local ok"},"done":true}"#)
            .create_async()
            .await;

        let text = backend(&server.url())
            .generate("sys", &[Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "local ok");
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Port 9 (discard) is closed on test machines
        let err = backend("http://127.0.0.1:9")
            .generate("sys", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Backend {
                code: BackendCode::Connect,
                ..
            }
        ));
    }
}
