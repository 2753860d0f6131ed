use crate::agents::{AgentRole, AgentStatus, CodeChange, Task, TaskResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How a project's tasks are dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// All workers at once
    #[default]
    Parallel,
    /// Workers one after another, in registration order
    Sequential,
}

impl ExecutionMode {
    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

/// One development request and everything produced for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,
    /// Project name
    pub name: String,
    /// Original request
    pub request: String,
    /// Dispatch mode
    pub mode: ExecutionMode,
    /// Tasks in creation order
    pub tasks: Vec<Task>,
    /// Results keyed by task ID
    pub results: HashMap<Uuid, TaskResult>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Set once every task has a result
    pub finished_at: Option<DateTime<Utc>>,
}

impl Project {
    pub(crate) fn new(
        name: impl Into<String>,
        request: impl Into<String>,
        mode: ExecutionMode,
        tasks: Vec<Task>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            request: request.into(),
            mode,
            tasks,
            results: HashMap::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Result of `task`, if recorded
    #[must_use]
    pub fn result_for(&self, task: &Task) -> Option<&TaskResult> {
        self.results.get(&task.id)
    }

    /// Recorded results in task order
    pub fn ordered_results(&self) -> impl Iterator<Item = &TaskResult> {
        self.tasks.iter().filter_map(|task| self.results.get(&task.id))
    }

    /// Number of successful tasks
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    /// Number of failed tasks
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Whether every task has a result
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Every extracted change, in task order
    pub fn code_changes(&self) -> impl Iterator<Item = &CodeChange> {
        self.ordered_results().flat_map(TaskResult::changes)
    }

    /// Lightweight summary for the registry
    #[must_use]
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            mode: self.mode,
            tasks_total: self.tasks.len(),
            tasks_completed: self.succeeded(),
            tasks_failed: self.failed(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Registry entry for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Project ID
    pub id: Uuid,
    /// Project name
    pub name: String,
    /// Dispatch mode
    pub mode: ExecutionMode,
    /// Number of tasks
    pub tasks_total: usize,
    /// Tasks that succeeded so far
    pub tasks_completed: usize,
    /// Tasks that failed so far
    pub tasks_failed: usize,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time, once finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProjectSummary {
    /// Tasks still waiting for a result
    #[must_use]
    pub fn tasks_pending(&self) -> usize {
        self.tasks_total
            .saturating_sub(self.tasks_completed + self.tasks_failed)
    }
}

/// Point-in-time view of one worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent name
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Status when the snapshot was taken
    pub status: AgentStatus,
}

/// Point-in-time view of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Workers keyed by role
    pub agents: BTreeMap<AgentRole, AgentSnapshot>,
    /// Projects started so far
    pub projects: Vec<ProjectSummary>,
}
