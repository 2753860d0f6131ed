use super::*;
use crate::agents::{AgentStatus, ChangeAction};
use crate::error::OrchestratorError;
use kelion_llm::{Error, MockBackend};
use std::time::Duration;

const FRONTEND_REPLY: &str = "Layout done.\nFILE: web/index.html\nACTION: create\n```html\n<main></main>\n```";

fn single(backend: MockBackend) -> BackendPool<MockBackend> {
    BackendPool::new().with_backend(backend)
}

/// Backend that fails for the backend role and answers everyone else
fn picky_backend() -> MockBackend {
    MockBackend::from_fn("mock", |system, _| {
        if system.contains("Backend Developer") {
            Err(Error::RateLimited)
        } else {
            Ok(FRONTEND_REPLY.to_string())
        }
    })
}

#[test]
fn test_new_registers_every_role_in_order() {
    let orchestrator = Orchestrator::new(single(MockBackend::replying("m", "ok")));
    let roles: Vec<_> = orchestrator.workers().iter().map(|w| w.role()).collect();

    assert_eq!(roles, AgentRole::ALL.to_vec());
    assert!(orchestrator
        .workers()
        .iter()
        .all(|w| w.status() == AgentStatus::Idle));
    assert_eq!(orchestrator.projects_started(), 0);
}

#[test]
fn test_with_roles_ignores_duplicates() {
    let orchestrator = Orchestrator::with_roles(
        single(MockBackend::replying("m", "ok")),
        [AgentRole::Frontend, AgentRole::Backend, AgentRole::Frontend],
    );

    assert_eq!(orchestrator.workers().len(), 2);
    assert_eq!(orchestrator.workers()[0].role(), AgentRole::Frontend);
    assert!(orchestrator.worker(AgentRole::Backend).is_some());
    assert!(orchestrator.worker(AgentRole::Database).is_none());
}

#[tokio::test]
async fn test_empty_pool_fails_fast() {
    let orchestrator: Orchestrator<MockBackend> = Orchestrator::new(BackendPool::new());
    let err = orchestrator
        .execute_project("p", "build", ExecutionMode::Parallel)
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::NoProviders));
    assert_eq!(orchestrator.projects_started(), 0);
    assert!(orchestrator.status().projects.is_empty());
}

#[tokio::test]
async fn test_every_role_gets_a_result_despite_failures() {
    for mode in [ExecutionMode::Parallel, ExecutionMode::Sequential] {
        let orchestrator = Orchestrator::new(single(picky_backend()));
        let project = orchestrator
            .execute_project("Login", "Add a login page", mode)
            .await
            .unwrap();

        assert_eq!(project.results.len(), 6);
        assert_eq!(project.results.len(), project.tasks.len());
        assert_eq!(project.succeeded(), 5);
        assert_eq!(project.failed(), 1);
        assert!(project.is_finished());
        assert!(project.tasks.iter().all(|t| t.description == "Add a login page"));
    }
}

#[tokio::test]
async fn test_sequential_backend_fails_frontend_succeeds() {
    let orchestrator = Orchestrator::with_roles(
        single(picky_backend()),
        [AgentRole::Backend, AgentRole::Frontend],
    );

    let project = orchestrator
        .execute_project("Demo", "Add a login page", ExecutionMode::Sequential)
        .await
        .unwrap();

    assert_eq!(project.succeeded(), 1);
    assert_eq!(project.failed(), 1);

    let backend = project.result_for(&project.tasks[0]).unwrap();
    let frontend = project.result_for(&project.tasks[1]).unwrap();
    assert_eq!(backend.role, AgentRole::Backend);
    assert!(!backend.is_success());
    assert!(backend.changes().is_empty());
    assert!(frontend.is_success());

    let changes = all_code_changes(&project);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].file, "web/index.html");
    assert_eq!(changes[0].action, ChangeAction::Create);

    assert_eq!(
        orchestrator.worker(AgentRole::Backend).unwrap().status(),
        AgentStatus::Error
    );
    assert_eq!(
        orchestrator.worker(AgentRole::Frontend).unwrap().status(),
        AgentStatus::Completed
    );
}

#[tokio::test]
async fn test_sequential_follows_registration_order() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let backend = {
        let seen = Arc::clone(&seen);
        MockBackend::from_fn("echo", move |system, _| {
            let first = system.lines().next().unwrap_or_default().to_string();
            seen.lock().unwrap().push(first.clone());
            Ok(first)
        })
    };
    let orchestrator = Orchestrator::with_roles(
        single(backend),
        [AgentRole::Database, AgentRole::Backend, AgentRole::Tester],
    );

    let project = orchestrator
        .execute_project("Order", "x", ExecutionMode::Sequential)
        .await
        .unwrap();
    assert_eq!(project.succeeded(), 3);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].contains("Database"));
    assert!(seen[1].contains("Backend"));
    assert!(seen[2].contains("QA"));
    assert_eq!(orchestrator.pool().backends()[0].peak_concurrency(), 1);
}

#[tokio::test]
async fn test_parallel_runs_workers_concurrently() {
    let orchestrator = Orchestrator::new(single(
        MockBackend::replying("slow", "ok").with_delay(Duration::from_millis(50)),
    ));

    let project = orchestrator
        .execute_project("Fan-out", "x", ExecutionMode::Parallel)
        .await
        .unwrap();

    assert_eq!(project.succeeded(), 6);
    let backend = &orchestrator.pool().backends()[0];
    assert_eq!(backend.calls(), 6);
    assert_eq!(backend.peak_concurrency(), 6);
    assert_eq!(orchestrator.projects_started(), 1);
}

#[tokio::test]
async fn test_workers_share_one_pool() {
    let orchestrator = Orchestrator::with_roles(
        BackendPool::new()
            .with_backend(MockBackend::replying("a", "ok"))
            .with_backend(MockBackend::replying("b", "ok"))
            .with_backend(MockBackend::replying("c", "ok")),
        [AgentRole::Backend, AgentRole::Frontend, AgentRole::Tester],
    );

    let project = orchestrator
        .execute_project("Spread", "x", ExecutionMode::Sequential)
        .await
        .unwrap();

    // Round robin across the shared cursor: one task per backend
    let backends: Vec<_> = project
        .ordered_results()
        .filter_map(|r| r.backend())
        .collect();
    assert_eq!(backends, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_parallel_fallback_reaches_healthy_backend() {
    let orchestrator = Orchestrator::new(
        BackendPool::new()
            .with_backend(
                MockBackend::failing("A", Error::RateLimited).with_delay(Duration::from_millis(20)),
            )
            .with_backend(MockBackend::replying("B", "ok").with_delay(Duration::from_millis(20))),
    );

    let project = orchestrator
        .execute_project("Overlap", "x", ExecutionMode::Parallel)
        .await
        .unwrap();

    assert_eq!(project.failed(), 0);
    assert_eq!(project.succeeded(), 6);
    assert!(project.ordered_results().all(|r| r.backend() == Some("B")));

    let pool = orchestrator.pool();
    assert_eq!(pool.backends()[1].calls(), 6);
    // Half the tasks start on A and fall back exactly once
    assert_eq!(pool.backends()[0].calls(), 3);
}

#[tokio::test]
async fn test_status_is_stable_without_execution() {
    let orchestrator = Orchestrator::new(single(MockBackend::replying("m", "ok")));
    orchestrator
        .execute_project("p", "x", ExecutionMode::Parallel)
        .await
        .unwrap();

    let first = orchestrator.status();
    let second = orchestrator.status();
    assert_eq!(first, second);
    assert_eq!(first.agents.len(), 6);
    assert_eq!(first.agents[&AgentRole::Tester].name, "QAExpert");
    assert!(first
        .agents
        .values()
        .all(|a| a.status == AgentStatus::Completed));
}

#[tokio::test]
async fn test_status_during_in_flight_project() {
    let orchestrator = Arc::new(Orchestrator::new(single(
        MockBackend::replying("slow", "ok").with_delay(Duration::from_millis(200)),
    )));

    let running = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .execute_project("Live", "x", ExecutionMode::Parallel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = orchestrator.status();
    assert!(status.agents.values().all(|a| a.status == AgentStatus::Working));
    assert_eq!(status.projects.len(), 1);
    assert_eq!(status.projects[0].tasks_pending(), 6);
    assert!(status.projects[0].finished_at.is_none());

    let project = running.await.unwrap().unwrap();
    let status = orchestrator.status();
    assert_eq!(status.projects[0].tasks_completed, 6);
    assert_eq!(status.projects[0].finished_at, project.finished_at);
}

#[tokio::test]
async fn test_report_counts_and_lines() {
    let orchestrator = Orchestrator::with_roles(
        single(picky_backend()),
        [AgentRole::Backend, AgentRole::Frontend],
    );
    let project = orchestrator
        .execute_project("Report", "x", ExecutionMode::Sequential)
        .await
        .unwrap();

    let report = project.report(10);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.lines.len(), 2);
    assert!(!report.lines[0].success);
    assert_eq!(report.lines[1].detail, "mock");
    assert_eq!(report.lines[1].excerpt, "Layout don...");

    let text = project_summary(&project);
    assert!(text.contains("Project: Report"));
    assert!(text.contains("1 succeeded"));
    assert!(text.contains("1 failed"));
    assert!(text.contains("Frontend Developer"));
    assert!(text.contains("rate limited"));
}
