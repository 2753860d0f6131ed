//! Code-change extraction
//!
//! Agents describe file edits in a line-oriented convention:
//!
//! ````text
//! FILE: src/app.py
//! ACTION: create
//! ```python
//! print("hi")
//! ```
//! ````
//!
//! Anything outside such blocks is prose and ignored.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// `FILE:` header, tolerating Markdown heading hashes, bullets and bold markers
static FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#+\s*)?(?:[-*]\s+)?(?:\*\*)?FILE:(?:\*\*)?\s*(.+?)\s*$")
        .expect("FILE_REGEX is a compile-time constant")
});

static ACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\*\*)?ACTION:(?:\*\*)?\s*(\S+)\s*$")
        .expect("ACTION_REGEX is a compile-time constant")
});

/// What to do with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// New file
    Create,
    /// Replace an existing file
    Modify,
    /// Remove a file
    Delete,
}

impl ChangeAction {
    /// Lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "modify" => Ok(Self::Modify),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown change action: {other}")),
        }
    }
}

/// A file edit proposed by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    /// Path relative to the project root
    pub file: String,
    /// Action
    pub action: ChangeAction,
    /// Full file content (empty for deletes)
    pub content: String,
}

struct Pending {
    file: String,
    action: Option<ChangeAction>,
    invalid_action: bool,
}

impl Pending {
    fn finish(self, content: String) -> Option<CodeChange> {
        if self.invalid_action {
            tracing::debug!(file = %self.file, "Dropping change with unknown action");
            return None;
        }
        Some(CodeChange {
            file: self.file,
            action: self.action.unwrap_or(ChangeAction::Modify),
            content,
        })
    }
}

/// Extract every well-formed change block from `text`, in order
#[must_use]
pub fn parse_code_changes(text: &str) -> Vec<CodeChange> {
    let mut changes = Vec::new();
    let mut pending: Option<Pending> = None;
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if let Some(caps) = FILE_REGEX.captures(line) {
            // A new header closes a delete that had no fence
            if let Some(prev) = pending.take() {
                if prev.action == Some(ChangeAction::Delete) {
                    changes.extend(prev.finish(String::new()));
                }
            }
            let file = caps[1].trim_matches(|c| c == '`' || c == '*').to_string();
            if !file.is_empty() {
                pending = Some(Pending {
                    file,
                    action: None,
                    invalid_action: false,
                });
            }
            continue;
        }

        let Some(current) = pending.as_mut() else {
            continue;
        };

        if let Some(caps) = ACTION_REGEX.captures(line) {
            match caps[1].parse::<ChangeAction>() {
                Ok(action) => current.action = Some(action),
                Err(_) => current.invalid_action = true,
            }
            continue;
        }

        if line.trim_start().starts_with("```") {
            let mut body = Vec::new();
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with("```") {
                    break;
                }
                body.push(inner);
            }
            if let Some(done) = pending.take() {
                changes.extend(done.finish(body.join("\n")));
            }
        }
    }

    if let Some(last) = pending {
        if last.action == Some(ChangeAction::Delete) {
            changes.extend(last.finish(String::new()));
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_create_block() {
        let text = "Here is the module.\n\nFILE: src/app.py\nACTION: create\n```python\nprint('hi')\nprint('bye')\n```\nDone.";
        let changes = parse_code_changes(text);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file, "src/app.py");
        assert_eq!(changes[0].action, ChangeAction::Create);
        assert_eq!(changes[0].content, "print('hi')\nprint('bye')");
    }

    #[test]
    fn test_markdown_prefixed_headers_and_default_action() {
        let text = "### FILE: README.md\n```markdown\n# Title\n```\n**FILE:** `docs/api.md`\nACTION: Modify\n```\nbody\n```";
        let changes = parse_code_changes(text);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].file, "README.md");
        assert_eq!(changes[0].action, ChangeAction::Modify);
        assert_eq!(changes[1].file, "docs/api.md");
        assert_eq!(changes[1].content, "body");
    }

    #[test]
    fn test_unknown_action_is_dropped() {
        let text = "FILE: a.txt\nACTION: rename\n```\nx\n```\nFILE: b.txt\nACTION: create\n```\ny\n```";
        let changes = parse_code_changes(text);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file, "b.txt");
    }

    #[test]
    fn test_delete_needs_no_content() {
        let text = "FILE: old.py\nACTION: delete\n\nFILE: new.py\nACTION: create\n```\npass\n```\nFILE: legacy.py\nACTION: delete";
        let changes = parse_code_changes(text);

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].action, ChangeAction::Delete);
        assert!(changes[0].content.is_empty());
        assert_eq!(changes[1].file, "new.py");
        assert_eq!(changes[2].file, "legacy.py");
    }

    #[test]
    fn test_unterminated_fence_keeps_content() {
        let text = "FILE: cut.rs\nACTION: create\n```rust\nfn main() {\n";
        let changes = parse_code_changes(text);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].content, "fn main() {");
    }

    #[test]
    fn test_prose_without_blocks() {
        assert!(parse_code_changes("No files needed for this task.").is_empty());
        // A fence without a FILE header is ignored
        assert!(parse_code_changes("```\nsnippet\n```").is_empty());
    }
}
