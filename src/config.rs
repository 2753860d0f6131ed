//! Application configuration
//!
//! Layers, lowest priority first: embedded defaults, `config/local.toml`
//! (or the file given with `--config`), then `KELION_` environment variables.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use kelion_core::ExecutionMode;
use kelion_llm::{BackendConfig, ServiceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend settings shared by every service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Services in pool order
    pub services: Vec<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-service model overrides
    #[serde(default)]
    pub models: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub mode: ExecutionMode,
    pub preview_chars: usize,
    pub excerpt_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Daily-rolling log files are written here when set
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_filter() -> String {
    "kelion=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            directory: None,
        }
    }
}

/// Load configuration from files and environment
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    // 2. File overrides
    builder = match path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::with_name("config/local").required(false)),
    };

    // 3. Environment variables (highest priority)
    // prefix_separator("_") makes KELION_LLM__X work with a single underscore
    let config = builder
        .add_source(
            Environment::with_prefix("KELION")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("llm.services")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    config.validate()?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

impl AppConfig {
    /// Reject settings no backend could work with
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            bail!("llm.timeout_secs must be greater than zero");
        }
        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be greater than zero");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            );
        }
        self.services()?;
        for name in self.llm.models.keys() {
            name.parse::<ServiceKind>()
                .with_context(|| format!("Invalid key in [llm.models]: {name}"))?;
        }
        Ok(())
    }

    /// Configured services, parsed and deduplicated
    pub fn services(&self) -> Result<Vec<ServiceKind>> {
        if self.llm.services.is_empty() {
            bail!("llm.services must list at least one service");
        }
        let mut kinds = Vec::new();
        for name in &self.llm.services {
            let kind: ServiceKind = name
                .parse()
                .with_context(|| format!("Invalid service in llm.services: {name}"))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    fn model_for(&self, kind: ServiceKind) -> Option<&str> {
        self.llm
            .models
            .iter()
            .find(|(name, _)| name.parse::<ServiceKind>().ok() == Some(kind))
            .map(|(_, model)| model.as_str())
    }

    /// Backend configurations for every service with a credential
    ///
    /// `anthropic_key` takes precedence over the environment for Anthropic.
    pub fn backend_configs(&self, anthropic_key: Option<&str>) -> Result<Vec<BackendConfig>> {
        let mut configs = Vec::new();
        for kind in self.services()? {
            let base = match (kind, anthropic_key) {
                (ServiceKind::Anthropic, Some(key)) if !key.trim().is_empty() => {
                    Some(BackendConfig::new(kind, key.trim()))
                }
                _ => BackendConfig::from_env(kind),
            };
            let Some(mut config) = base else {
                debug!(service = %kind, "No credential, skipping");
                continue;
            };

            if let Some(model) = self.model_for(kind) {
                config = config.with_model(model);
            }
            configs.push(
                config
                    .with_timeout(Duration::from_secs(self.llm.timeout_secs))
                    .with_max_tokens(self.llm.max_tokens)
                    .with_temperature(self.llm.temperature),
            );
        }
        Ok(configs)
    }
}
