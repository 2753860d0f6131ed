//! Worker - one role bound to the shared backend pool

use super::changes::parse_code_changes;
use super::role::{AgentRole, RoleProfile};
use super::task::{Task, TaskOutcome, TaskResult};
use kelion_llm::{Adapter, Backend, BackendPool, Message};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Worker lifecycle state
///
/// `Idle -> Working -> {Completed | Error} -> Idle`. A terminal state stays
/// visible until the next run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Waiting for work
    Idle,
    /// Running a task
    Working,
    /// Last task succeeded
    Completed,
    /// Last task failed
    Error,
}

impl AgentStatus {
    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Working)
                | (Self::Working, Self::Completed)
                | (Self::Working, Self::Error)
                | (Self::Completed, Self::Idle)
                | (Self::Error, Self::Idle)
        )
    }

    /// Enter `Working`, passing through `Idle` from a terminal state
    ///
    /// Returns `false` and leaves the status untouched while already working.
    fn start(&mut self) -> bool {
        if self.can_transition_to(Self::Idle) {
            *self = Self::Idle;
        }
        if !self.can_transition_to(Self::Working) {
            return false;
        }
        *self = Self::Working;
        true
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specialized agent
pub struct Worker<B: Backend = Adapter> {
    role: AgentRole,
    pool: Arc<BackendPool<B>>,
    status: Mutex<AgentStatus>,
}

impl<B: Backend> fmt::Debug for Worker<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("role", &self.role)
            .field("status", &self.status())
            .finish()
    }
}

impl<B: Backend> Worker<B> {
    /// Create an idle worker for `role`
    pub fn new(role: AgentRole, pool: Arc<BackendPool<B>>) -> Self {
        Self {
            role,
            pool,
            status: Mutex::new(AgentStatus::Idle),
        }
    }

    /// Role
    #[must_use]
    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Static profile of the role
    #[must_use]
    pub fn profile(&self) -> &'static RoleProfile {
        self.role.profile()
    }

    /// Agent name
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.profile().name
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> AgentStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the worker for a run; `false` if it is already working
    fn begin(&self) -> bool {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        let previous = *status;
        if !status.start() {
            return false;
        }
        if previous != AgentStatus::Idle {
            debug!(role = %self.role, from = previous.as_str(), "Reset to idle before run");
        }
        true
    }

    fn finish(&self, next: AgentStatus) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if !status.can_transition_to(next) {
            warn!(role = %self.role, from = status.as_str(), to = next.as_str(), "Unexpected status transition");
        }
        *status = next;
    }

    /// Run one task through the pool
    ///
    /// Never fails: backend errors become a failed [`TaskResult`].
    #[instrument(skip_all, fields(role = %self.role, task_id = %task.id))]
    pub async fn run(&self, task: &Task) -> TaskResult {
        if !self.begin() {
            warn!("Worker busy, refusing task");
            return TaskResult {
                task_id: task.id,
                role: task.role,
                outcome: TaskOutcome::Failed {
                    error: "worker busy".to_string(),
                },
                duration_ms: 0,
            };
        }

        let start = Instant::now();
        let conversation = [Message::user(task.description.clone())];
        let result = self
            .pool
            .generate_with_fallback(self.profile().instructions, &conversation)
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(generation) => {
                let changes = parse_code_changes(&generation.content);
                info!(
                    backend = %generation.backend,
                    changes = changes.len(),
                    duration_ms,
                    "Agent task completed"
                );
                self.finish(AgentStatus::Completed);
                TaskOutcome::Succeeded {
                    output: generation.content,
                    backend: generation.backend,
                    changes,
                }
            }
            Err(e) => {
                warn!(error = %e, duration_ms, "Agent task failed");
                self.finish(AgentStatus::Error);
                TaskOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        TaskResult {
            task_id: task.id,
            role: task.role,
            outcome,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kelion_llm::{Error, MockBackend};
    use std::time::Duration;

    fn pool(backend: MockBackend) -> Arc<BackendPool<MockBackend>> {
        Arc::new(BackendPool::new().with_backend(backend))
    }

    #[test]
    fn test_transitions() {
        use AgentStatus as S;
        assert!(S::Idle.can_transition_to(S::Working));
        assert!(S::Working.can_transition_to(S::Completed));
        assert!(S::Working.can_transition_to(S::Error));
        assert!(S::Completed.can_transition_to(S::Idle));
        assert!(S::Error.can_transition_to(S::Idle));
        assert!(!S::Idle.can_transition_to(S::Completed));
        assert!(!S::Completed.can_transition_to(S::Working));
        assert!(!S::Working.can_transition_to(S::Idle));
    }

    #[test]
    fn test_start_resets_terminal_state() {
        use AgentStatus as S;
        for from in [S::Idle, S::Completed, S::Error] {
            let mut status = from;
            assert!(status.start(), "{from} should start");
            assert_eq!(status, S::Working);
        }

        let mut status = S::Working;
        assert!(!status.start());
        assert_eq!(status, S::Working);
    }

    #[tokio::test]
    async fn test_rerun_after_error_completes() {
        let backend = MockBackend::from_fn("mock", |_, conversation| {
            if conversation[0].content == "first" {
                Err(Error::RateLimited)
            } else {
                Ok("ok".to_string())
            }
        });
        let worker = Worker::new(AgentRole::Tester, pool(backend));

        assert!(!worker.run(&Task::new(AgentRole::Tester, "first")).await.is_success());
        assert_eq!(worker.status(), AgentStatus::Error);

        assert!(worker.run(&Task::new(AgentRole::Tester, "second")).await.is_success());
        assert_eq!(worker.status(), AgentStatus::Completed);
    }

    #[tokio::test]
    async fn test_run_success_extracts_changes() {
        let reply = "FILE: api.py\nACTION: create\n```python\napp = 1\n```";
        let worker = Worker::new(AgentRole::Backend, pool(MockBackend::replying("mock", reply)));
        let task = Task::new(AgentRole::Backend, "add an endpoint");

        let result = worker.run(&task).await;

        assert!(result.is_success());
        assert_eq!(result.task_id, task.id);
        assert_eq!(result.backend(), Some("mock"));
        assert_eq!(result.changes()[0].file, "api.py");
        assert_eq!(worker.status(), AgentStatus::Completed);
    }

    #[tokio::test]
    async fn test_run_sends_role_instructions_and_request() {
        let backend = MockBackend::from_fn("mock", |system, conversation| {
            assert!(system.starts_with("You are an expert Security"));
            assert_eq!(conversation.len(), 1);
            Ok(conversation[0].content.clone())
        });
        let worker = Worker::new(AgentRole::Security, pool(backend));

        let result = worker.run(&Task::new(AgentRole::Security, "audit login")).await;
        assert_eq!(result.output(), Some("audit login"));
    }

    #[tokio::test]
    async fn test_run_failure_sets_error() {
        let worker = Worker::new(
            AgentRole::Tester,
            pool(MockBackend::failing("mock", Error::RateLimited)),
        );

        let result = worker.run(&Task::new(AgentRole::Tester, "write tests")).await;

        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("mock: rate limited"));
        assert_eq!(worker.status(), AgentStatus::Error);

        // Terminal state persists until the next run
        assert_eq!(worker.status(), AgentStatus::Error);
    }

    #[tokio::test]
    async fn test_busy_worker_refuses_second_task() {
        let worker = Arc::new(Worker::new(
            AgentRole::Database,
            pool(MockBackend::replying("slow", "ok").with_delay(Duration::from_millis(100))),
        ));

        let first = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.run(&Task::new(AgentRole::Database, "one")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(worker.status(), AgentStatus::Working);

        let second = worker.run(&Task::new(AgentRole::Database, "two")).await;
        assert_eq!(second.error(), Some("worker busy"));

        assert!(first.await.unwrap().is_success());
        assert_eq!(worker.status(), AgentStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_pool_fails_task() {
        let worker: Worker<MockBackend> = Worker::new(AgentRole::Frontend, Arc::new(BackendPool::new()));
        let result = worker.run(&Task::new(AgentRole::Frontend, "ui")).await;
        assert_eq!(result.error(), Some("no providers available in pool"));
    }
}
