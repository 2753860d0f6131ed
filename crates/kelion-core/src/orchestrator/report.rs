//! Project reports

use super::types::{ExecutionMode, Project};
use crate::agents::{AgentRole, CodeChange, TaskOutcome};
use kelion_llm::util::truncate_safe;
use std::fmt;

/// Default excerpt length per role line
pub const DEFAULT_EXCERPT_CHARS: usize = 100;

const RULE: &str = "──────────────────────────────────────────────────";

/// One role's line in a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Role
    pub role: AgentRole,
    /// Whether the task succeeded
    pub success: bool,
    /// Serving backend or error text
    pub detail: String,
    /// Leading text of the output
    pub excerpt: String,
    /// Number of extracted changes
    pub changes: usize,
}

/// Human-readable summary of a finished project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    /// Project name
    pub name: String,
    /// Dispatch mode
    pub mode: ExecutionMode,
    /// Successful tasks
    pub succeeded: usize,
    /// Failed tasks
    pub failed: usize,
    /// Wall time, if finished
    pub duration_ms: Option<i64>,
    /// Per-role lines in task order
    pub lines: Vec<ReportLine>,
}

/// Collapse whitespace and cut to `max_chars`
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = truncate_safe(&flat, max_chars);
    if cut.len() < flat.len() {
        format!("{cut}...")
    } else {
        flat
    }
}

impl Project {
    /// Build a report, cutting output excerpts at `excerpt_chars`
    #[must_use]
    pub fn report(&self, excerpt_chars: usize) -> ProjectReport {
        let lines = self
            .ordered_results()
            .map(|result| match &result.outcome {
                TaskOutcome::Succeeded {
                    output,
                    backend,
                    changes,
                } => ReportLine {
                    role: result.role,
                    success: true,
                    detail: backend.clone(),
                    excerpt: excerpt(output, excerpt_chars),
                    changes: changes.len(),
                },
                TaskOutcome::Failed { error } => ReportLine {
                    role: result.role,
                    success: false,
                    detail: error.clone(),
                    excerpt: String::new(),
                    changes: 0,
                },
            })
            .collect();

        ProjectReport {
            name: self.name.clone(),
            mode: self.mode,
            succeeded: self.succeeded(),
            failed: self.failed(),
            duration_ms: self
                .finished_at
                .map(|end| (end - self.started_at).num_milliseconds()),
            lines,
        }
    }
}

impl fmt::Display for ProjectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "📋 Project: {}", self.name)?;
        write!(
            f,
            "   Mode: {} | ✅ {} succeeded | ❌ {} failed",
            self.mode, self.succeeded, self.failed
        )?;
        if let Some(ms) = self.duration_ms {
            write!(f, " | {} ms", ms)?;
        }
        writeln!(f)?;
        writeln!(f, "{RULE}")?;

        for line in &self.lines {
            let profile = line.role.profile();
            let mark = if line.success { "✅" } else { "❌" };
            if line.success {
                writeln!(
                    f,
                    "  {} {} {:<20} via {} ({} changes)",
                    mark, profile.icon, profile.display_name, line.detail, line.changes
                )?;
                if !line.excerpt.is_empty() {
                    writeln!(f, "       {}", line.excerpt)?;
                }
            } else {
                writeln!(
                    f,
                    "  {} {} {:<20} error: {}",
                    mark, profile.icon, profile.display_name, line.detail
                )?;
            }
        }
        Ok(())
    }
}

/// Render the default report for `project`
#[must_use]
pub fn project_summary(project: &Project) -> String {
    project.report(DEFAULT_EXCERPT_CHARS).to_string()
}

/// Every extracted change in task order
#[must_use]
pub fn all_code_changes(project: &Project) -> Vec<CodeChange> {
    project.code_changes().cloned().collect()
}
