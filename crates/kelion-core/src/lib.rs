//! Kelion Core - Multi-Agent Orchestration Engine
//!
//! This crate turns one development request into a project:
//! - Agents: role profiles, tasks and the worker state machine
//! - Changes: extraction of file edits from free-form replies
//! - Orchestrator: broadcast dispatch (parallel or sequential), status and
//!   reporting

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod error;
pub mod orchestrator;

pub use agents::{
    parse_code_changes, AgentRole, AgentStatus, ChangeAction, CodeChange, RoleProfile, Task,
    TaskOutcome, TaskResult, Worker,
};
pub use error::{OrchestratorError, Result};
pub use orchestrator::{
    all_code_changes, project_summary, AgentSnapshot, ExecutionMode, Orchestrator,
    OrchestratorStatus, Project, ProjectReport, ProjectSummary, ReportLine,
    DEFAULT_EXCERPT_CHARS,
};
