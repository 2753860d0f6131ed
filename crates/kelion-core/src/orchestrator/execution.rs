use super::types::{ExecutionMode, Project, ProjectSummary};
use super::Orchestrator;
use crate::agents::{Task, TaskResult};
use crate::error::{OrchestratorError, Result};
use chrono::Utc;
use futures::future::join_all;
use kelion_llm::Backend;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

impl<B: Backend> Orchestrator<B> {
    /// Run `request` through every registered worker
    ///
    /// Fails only when the pool is empty. Individual task failures are
    /// recorded in the project; the returned project always holds one
    /// result per task.
    #[instrument(skip_all, fields(project = %name.as_ref(), mode = %mode))]
    pub async fn execute_project(
        &self,
        name: impl AsRef<str>,
        request: impl AsRef<str>,
        mode: ExecutionMode,
    ) -> Result<Project> {
        if self.pool.is_empty() {
            return Err(OrchestratorError::NoProviders);
        }

        let request = request.as_ref();
        let tasks = self
            .workers
            .iter()
            .map(|worker| Task::new(worker.role(), request))
            .collect();
        let mut project = Project::new(name.as_ref(), request, mode, tasks);

        self.projects_started.fetch_add(1, Ordering::SeqCst);
        self.register(project.summary());
        info!(project_id = %project.id, tasks = project.tasks.len(), "Project started");

        let start = Instant::now();
        let results = match mode {
            ExecutionMode::Sequential => self.run_sequential(&project).await,
            ExecutionMode::Parallel => self.run_parallel(&project).await,
        };

        for result in results {
            project.results.insert(result.task_id, result);
        }
        project.finished_at = Some(Utc::now());
        self.update(project.id, |summary| summary.finished_at = project.finished_at);

        info!(
            project_id = %project.id,
            succeeded = project.succeeded(),
            failed = project.failed(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Project finished"
        );

        Ok(project)
    }

    async fn run_sequential(&self, project: &Project) -> Vec<TaskResult> {
        let mut results = Vec::with_capacity(project.tasks.len());
        for (worker, task) in self.workers.iter().zip(&project.tasks) {
            debug!(role = %worker.role(), "Dispatching task");
            let result = worker.run(task).await;
            self.record(project.id, &result);
            results.push(result);
        }
        results
    }

    async fn run_parallel(&self, project: &Project) -> Vec<TaskResult> {
        let runs = self
            .workers
            .iter()
            .zip(&project.tasks)
            .map(|(worker, task)| async move {
                let result = worker.run(task).await;
                self.record(project.id, &result);
                result
            });
        join_all(runs).await
    }

    fn register(&self, summary: ProjectSummary) {
        self.projects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(summary);
    }

    fn record(&self, project_id: Uuid, result: &TaskResult) {
        let success = result.is_success();
        self.update(project_id, |summary| {
            if success {
                summary.tasks_completed += 1;
            } else {
                summary.tasks_failed += 1;
            }
        });
    }

    fn update(&self, project_id: Uuid, apply: impl FnOnce(&mut ProjectSummary)) {
        let mut projects = self.projects.write().unwrap_or_else(|e| e.into_inner());
        if let Some(summary) = projects.iter_mut().find(|p| p.id == project_id) {
            apply(summary);
        }
    }
}
