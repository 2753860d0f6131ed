//! Tasks and their results

use super::changes::CodeChange;
use super::role::AgentRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,
    /// Role that should handle the task
    pub role: AgentRole,
    /// What to do
    pub description: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task for `role`
    pub fn new(role: AgentRole, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// A backend produced output
    Succeeded {
        /// Raw model response
        output: String,
        /// Backend that served the request
        backend: String,
        /// File edits extracted from the output
        changes: Vec<CodeChange>,
    },
    /// No backend produced output
    Failed {
        /// Error text
        error: String,
    },
}

/// Result of one task, produced exactly once per task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task this result belongs to
    pub task_id: Uuid,
    /// Role that ran it
    pub role: AgentRole,
    /// Outcome
    #[serde(flatten)]
    pub outcome: TaskOutcome,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl TaskResult {
    /// Whether the task succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Succeeded { .. })
    }

    /// Model output, if any
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Succeeded { output, .. } => Some(output),
            TaskOutcome::Failed { .. } => None,
        }
    }

    /// Serving backend, if any
    #[must_use]
    pub fn backend(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Succeeded { backend, .. } => Some(backend),
            TaskOutcome::Failed { .. } => None,
        }
    }

    /// Error text, if the task failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Failed { error } => Some(error),
            TaskOutcome::Succeeded { .. } => None,
        }
    }

    /// Extracted changes (empty on failure)
    #[must_use]
    pub fn changes(&self) -> &[CodeChange] {
        match &self.outcome {
            TaskOutcome::Succeeded { changes, .. } => changes,
            TaskOutcome::Failed { .. } => &[],
        }
    }
}
