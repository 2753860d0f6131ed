//! Multi-Agent System
//!
//! Each [`AgentRole`] maps to a static [`RoleProfile`]. A [`Worker`] binds a
//! role to the shared backend pool and turns one [`Task`] into one
//! [`TaskResult`].
//!
//! ```text
//! Task ──► Worker(role) ──► BackendPool::generate_with_fallback
//!                               │
//!                               ▼
//!                   TaskResult { outcome, changes }
//! ```

mod changes;
mod role;
mod task;
mod worker;

pub use changes::{parse_code_changes, ChangeAction, CodeChange};
pub use role::{AgentRole, RoleProfile};
pub use task::{Task, TaskOutcome, TaskResult};
pub use worker::{AgentStatus, Worker};
