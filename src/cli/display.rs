//! Terminal rendering for status and code changes

use kelion_core::{AgentStatus, ChangeAction, CodeChange, OrchestratorStatus};
use kelion_llm::util::truncate_safe;
use std::fmt::Write as _;

const RULE: &str = "──────────────────────────────────────────────────";

pub fn print_banner() {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║   🤖 KELION - Multi-Agent Development System                 ║
║                                                              ║
║                      🧠 ORCHESTRATOR                         ║
║        ┌──────┬──────┬──────┬──────┬──────┬──────┐           ║
║        🔧     🎨     🧪     📝     🔒     💾                  ║
║      BACKEND FRONT  TESTER  DOCS  SECUR.  DB                 ║
╚══════════════════════════════════════════════════════════════╝
"#
    );
}

fn status_icon(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Idle => "⚪",
        AgentStatus::Working => "🔵",
        AgentStatus::Completed => "🟢",
        AgentStatus::Error => "🔴",
    }
}

fn action_icon(action: ChangeAction) -> &'static str {
    match action {
        ChangeAction::Create => "➕",
        ChangeAction::Modify => "✏️",
        ChangeAction::Delete => "❌",
    }
}

pub fn render_status(status: &OrchestratorStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n📊 Agent Status:");
    let _ = writeln!(out, "{RULE}");

    for (role, agent) in &status.agents {
        let _ = writeln!(
            out,
            "  {} {:<20} {} {}",
            role.profile().icon,
            agent.name,
            status_icon(agent.status),
            agent.status
        );
    }

    if !status.projects.is_empty() {
        let _ = writeln!(out, "\n📁 Projects:");
        let _ = writeln!(out, "{RULE}");
        for project in &status.projects {
            let state = if project.finished_at.is_some() {
                "done"
            } else {
                "running"
            };
            let _ = writeln!(
                out,
                "  • {} ({}/{} tasks, {} failed, {})",
                project.name,
                project.tasks_completed,
                project.tasks_total,
                project.tasks_failed,
                state
            );
        }
    }
    out
}

pub fn print_status(status: &OrchestratorStatus, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
    } else {
        print!("{}", render_status(status));
    }
    Ok(())
}

/// Content preview cut at `preview_chars`, single line
fn preview(content: &str, preview_chars: usize) -> String {
    let flat = content.replace('\n', " ⏎ ");
    let cut = truncate_safe(&flat, preview_chars);
    if cut.len() < flat.len() {
        format!("{cut}...")
    } else {
        flat
    }
}

pub fn render_code_changes(changes: &[CodeChange], preview_chars: usize) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "\n📝 Code Changes Generated:");
    let _ = writeln!(out, "{RULE}");
    for change in changes {
        let _ = writeln!(
            out,
            "  {} {} ({})",
            action_icon(change.action),
            change.file,
            change.action
        );
        if !change.content.is_empty() {
            let _ = writeln!(out, "     Preview: {}", preview(&change.content, preview_chars));
        }
    }
    out
}
