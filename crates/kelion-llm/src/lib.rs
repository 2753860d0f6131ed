//! Kelion LLM - AI backend abstraction
//!
//! This crate provides the backend layer for Kelion:
//! - Backend: uniform `(system, conversation) -> text` trait
//! - Anthropic: Claude Messages API
//! - OpenAI: Chat Completions API
//! - Gemini: Google Generative Language API
//! - Local: Ollama chat API
//! - Pool: round-robin distribution with per-request fallback

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod backend;
pub mod config;
pub mod error;
pub mod gemini;
mod http;
pub mod local;
pub mod message;
pub mod mock;
pub mod openai;
pub mod pool;
pub mod util;

pub use backend::{Adapter, Backend};
pub use config::{BackendConfig, ServiceKind};
pub use error::{BackendCode, Error, ProviderFailure, Result};
pub use message::{Message, MessageRole};
pub use mock::MockBackend;
pub use pool::{BackendPool, Generation};

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use local::LocalBackend;
pub use openai::OpenAiBackend;
