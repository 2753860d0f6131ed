//! CLI module for Kelion
//!
//! - `kelion "request"`: run one project and print the report
//! - `kelion --status`: show worker and project status
//! - `kelion`: interactive mode

use crate::config::AppConfig;
use anyhow::Context;
use clap::Parser;
use kelion_core::{all_code_changes, ExecutionMode, Orchestrator};
use kelion_llm::util::mask_api_key;
use kelion_llm::{BackendPool, ServiceKind};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod display;
mod interactive;

/// Kelion multi-agent development CLI
#[derive(Parser, Debug)]
#[command(name = "kelion")]
#[command(about = "Multi-agent development system: one request, six specialized agents")]
#[command(version)]
#[command(after_help = "Examples:
  kelion                            # Interactive mode
  kelion \"Add user authentication\"  # Execute a single request
  kelion --status                   # Show agent status")]
pub struct Cli {
    /// Development request to process
    pub request: Option<String>,

    /// Show status of all agents
    #[arg(long)]
    pub status: bool,

    /// Print status as JSON
    #[arg(long, requires = "status")]
    pub json: bool,

    /// Execute tasks in parallel
    #[arg(long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Execute tasks sequentially
    #[arg(long)]
    pub sequential: bool,

    /// Anthropic API key (overrides ANTHROPIC_API_KEY / CLAUDE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Configuration file (replaces config/local.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project name for a single request
    #[arg(long, default_value = "CLI Task")]
    pub name: String,
}

impl Cli {
    /// Execution mode: flags win over configuration
    pub fn mode(&self, configured: ExecutionMode) -> ExecutionMode {
        if self.sequential {
            ExecutionMode::Sequential
        } else if self.parallel {
            ExecutionMode::Parallel
        } else {
            configured
        }
    }
}

fn print_missing_credentials() {
    eprintln!("❌ Error: No backend configured.");
    eprintln!("   Set one of the following environment variables or use --api-key:");
    for kind in ServiceKind::ALL {
        eprintln!("     {:<10} {}", kind.as_str(), kind.credential_vars().join(" / "));
    }
}

/// Run the CLI command
pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<ExitCode> {
    let quiet = cli.status && cli.json;
    if !quiet {
        display::print_banner();
    }

    let configs = config.backend_configs(cli.api_key.as_deref())?;
    if configs.is_empty() {
        print_missing_credentials();
        return Ok(ExitCode::FAILURE);
    }
    if !quiet {
        for backend in &configs {
            let credential = if backend.api_key().is_empty() {
                backend.base_url().to_string()
            } else {
                mask_api_key(backend.api_key())
            };
            println!("✅ {} ({}): {}", backend.kind(), backend.model(), credential);
        }
    }

    let pool = BackendPool::from_configs(configs).context("Failed to initialize backends")?;
    let orchestrator = Orchestrator::new(pool);
    if !quiet {
        println!(
            "✅ Initialized {} specialized agents",
            orchestrator.workers().len()
        );
    }

    if cli.status {
        display::print_status(&orchestrator.status(), cli.json)?;
        return Ok(ExitCode::SUCCESS);
    }

    config.orchestrator.mode = cli.mode(config.orchestrator.mode);

    if let Some(request) = cli.request.as_deref() {
        println!("\n🎯 Request: {request}");
        info!(mode = %config.orchestrator.mode, "Running single request");

        let project = orchestrator
            .execute_project(&cli.name, request, config.orchestrator.mode)
            .await?;

        print!("{}", project.report(config.orchestrator.excerpt_chars));
        print!(
            "{}",
            display::render_code_changes(
                &all_code_changes(&project),
                config.orchestrator.preview_chars
            )
        );
        return Ok(ExitCode::SUCCESS);
    }

    interactive::run(&orchestrator, &config).await?;
    Ok(ExitCode::SUCCESS)
}
