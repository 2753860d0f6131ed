//! Error types for kelion-core

use thiserror::Error;

/// Orchestrator errors
///
/// Per-task failures never surface here; they are recorded in the task's
/// [`TaskResult`](crate::agents::TaskResult). Only conditions that make a
/// whole project impossible abort `execute_project`.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The backend pool is empty
    #[error("no providers available: configure at least one backend")]
    NoProviders,
}

/// Orchestrator result type
pub type Result<T> = std::result::Result<T, OrchestratorError>;
