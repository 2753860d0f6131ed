//! Orchestrator
//!
//! Owns one worker per registered role and the shared backend pool. A
//! project broadcasts the request to every worker, dispatched in parallel
//! or in registration order, and collects exactly one result per task.

use crate::agents::{AgentRole, Worker};
use kelion_llm::{Adapter, Backend, BackendPool};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::info;

mod execution;
mod report;
mod types;

#[cfg(test)]
mod tests;

pub use report::{
    all_code_changes, project_summary, ProjectReport, ReportLine, DEFAULT_EXCERPT_CHARS,
};
pub use types::{AgentSnapshot, ExecutionMode, OrchestratorStatus, Project, ProjectSummary};

/// Multi-agent orchestrator
pub struct Orchestrator<B: Backend = Adapter> {
    /// Shared by every worker
    pool: Arc<BackendPool<B>>,
    /// Registered workers, in registration order
    workers: Vec<Worker<B>>,
    /// Summaries of every project started
    projects: RwLock<Vec<ProjectSummary>>,
    /// Number of `execute_project` calls that got past validation
    projects_started: AtomicUsize,
}

impl<B: Backend> fmt::Debug for Orchestrator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("pool", &self.pool)
            .field("workers", &self.workers)
            .finish()
    }
}

impl<B: Backend> Orchestrator<B> {
    /// Create an orchestrator with a worker for every role
    pub fn new(pool: BackendPool<B>) -> Self {
        Self::with_roles(pool, AgentRole::ALL)
    }

    /// Create an orchestrator with workers for `roles` only
    ///
    /// Duplicate roles are ignored; order of first appearance is kept.
    pub fn with_roles(pool: BackendPool<B>, roles: impl IntoIterator<Item = AgentRole>) -> Self {
        let pool = Arc::new(pool);
        let mut workers: Vec<Worker<B>> = Vec::new();
        for role in roles {
            if workers.iter().any(|w| w.role() == role) {
                continue;
            }
            workers.push(Worker::new(role, Arc::clone(&pool)));
        }

        info!(
            workers = workers.len(),
            backends = ?pool.names(),
            "Orchestrator initialized"
        );

        Self {
            pool,
            workers,
            projects: RwLock::new(Vec::new()),
            projects_started: AtomicUsize::new(0),
        }
    }

    /// Backend pool
    #[must_use]
    pub fn pool(&self) -> &BackendPool<B> {
        &self.pool
    }

    /// Registered workers
    #[must_use]
    pub fn workers(&self) -> &[Worker<B>] {
        &self.workers
    }

    /// Worker for `role`, if registered
    #[must_use]
    pub fn worker(&self, role: AgentRole) -> Option<&Worker<B>> {
        self.workers.iter().find(|w| w.role() == role)
    }

    /// Number of projects started
    #[must_use]
    pub fn projects_started(&self) -> usize {
        self.projects_started.load(Ordering::SeqCst)
    }

    /// Snapshot of every worker and project
    ///
    /// Safe to call while a project is running.
    #[must_use]
    pub fn status(&self) -> OrchestratorStatus {
        let agents = self
            .workers
            .iter()
            .map(|w| {
                (
                    w.role(),
                    AgentSnapshot {
                        name: w.name().to_string(),
                        display_name: w.profile().display_name.to_string(),
                        status: w.status(),
                    },
                )
            })
            .collect();

        let projects = self
            .projects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        OrchestratorStatus { agents, projects }
    }
}
