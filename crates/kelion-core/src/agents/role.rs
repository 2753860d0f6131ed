//! Agent roles and their static profiles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output convention every role is asked to follow for file edits
macro_rules! change_format {
    () => {
        "\n\n## Response Format:\n\
         Explain your approach briefly, then give every file you touch as:\n\n\
         FILE: relative/path.ext\n\
         ACTION: create|modify|delete\n\
         ```language\n\
         full file content\n\
         ```\n\n\
         Always provide complete file content. A delete needs no code block.\n"
    };
}

/// Specialized agent role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// APIs, business logic, server code
    Backend,
    /// UI, styling, client code
    Frontend,
    /// Tests and review
    Tester,
    /// Technical writing
    Documentation,
    /// Audits and hardening
    Security,
    /// Schemas and queries
    Database,
}

/// Static description of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProfile {
    /// Agent name (e.g., "BackendExpert")
    pub name: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Status icon
    pub icon: &'static str,
    /// System instructions sent with every task
    pub instructions: &'static str,
    /// Advertised capabilities
    pub capabilities: &'static [&'static str],
}

const BACKEND: RoleProfile = RoleProfile {
    name: "BackendExpert",
    display_name: "Backend Developer",
    icon: "🔧",
    instructions: concat!(
        "You are an expert Backend Developer agent on a multi-agent development team.\n\n\
         Design and implement APIs, business logic and data validation. \
         Write secure, maintainable code with error handling and logging.",
        change_format!()
    ),
    capabilities: &[
        "API design",
        "Business logic",
        "Database design",
        "Authentication systems",
        "Security implementation",
        "Data validation",
        "Background tasks",
    ],
};

const FRONTEND: RoleProfile = RoleProfile {
    name: "FrontendExpert",
    display_name: "Frontend Developer",
    icon: "🎨",
    instructions: concat!(
        "You are an expert Frontend Developer agent on a multi-agent development team.\n\n\
         Build responsive, accessible user interfaces with clean markup, \
         styling and client-side logic.",
        change_format!()
    ),
    capabilities: &[
        "HTML/CSS development",
        "JavaScript programming",
        "Responsive design",
        "UI/UX implementation",
        "Accessibility",
        "Performance optimization",
    ],
};

const TESTER: RoleProfile = RoleProfile {
    name: "QAExpert",
    display_name: "QA Engineer",
    icon: "🧪",
    instructions: concat!(
        "You are an expert QA agent on a multi-agent development team.\n\n\
         Write unit and integration tests, review code for defects and \
         point out edge cases the implementation misses.",
        change_format!()
    ),
    capabilities: &[
        "Unit testing",
        "Integration testing",
        "API testing",
        "Code review",
        "Bug identification",
        "Test automation",
    ],
};

const DOCUMENTATION: RoleProfile = RoleProfile {
    name: "DocExpert",
    display_name: "Technical Writer",
    icon: "📝",
    instructions: concat!(
        "You are an expert Technical Documentation agent on a multi-agent development team.\n\n\
         Write clear READMEs, API references and user guides for the requested change.",
        change_format!()
    ),
    capabilities: &[
        "Technical writing",
        "API documentation",
        "User guides",
        "README creation",
        "Architecture docs",
    ],
};

const SECURITY: RoleProfile = RoleProfile {
    name: "SecurityExpert",
    display_name: "Security Engineer",
    icon: "🔒",
    instructions: concat!(
        "You are an expert Security agent on a multi-agent development team.\n\n\
         Audit the requested change for vulnerabilities and provide hardened \
         code for input validation, authentication and secret handling.",
        change_format!()
    ),
    capabilities: &[
        "Security auditing",
        "Vulnerability detection",
        "Input validation",
        "Encryption implementation",
        "Security hardening",
        "OWASP compliance",
    ],
};

const DATABASE: RoleProfile = RoleProfile {
    name: "DatabaseExpert",
    display_name: "Database Engineer",
    icon: "💾",
    instructions: concat!(
        "You are an expert Database agent on a multi-agent development team.\n\n\
         Design schemas, migrations and queries. Keep data consistent and \
         queries indexed.",
        change_format!()
    ),
    capabilities: &[
        "Schema design",
        "SQL queries",
        "Query optimization",
        "Data migration",
        "Index management",
        "Performance tuning",
    ],
};

impl AgentRole {
    /// All roles in registration order
    pub const ALL: [AgentRole; 6] = [
        Self::Backend,
        Self::Frontend,
        Self::Tester,
        Self::Documentation,
        Self::Security,
        Self::Database,
    ];

    /// Stable lowercase identifier
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Tester => "tester",
            Self::Documentation => "documentation",
            Self::Security => "security",
            Self::Database => "database",
        }
    }

    /// Static profile for this role
    #[must_use]
    pub fn profile(&self) -> &'static RoleProfile {
        match self {
            Self::Backend => &BACKEND,
            Self::Frontend => &FRONTEND,
            Self::Tester => &TESTER,
            Self::Documentation => &DOCUMENTATION,
            Self::Security => &SECURITY,
            Self::Database => &DATABASE,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "backend" => Ok(Self::Backend),
            "frontend" => Ok(Self::Frontend),
            "tester" | "qa" => Ok(Self::Tester),
            "documentation" | "docs" => Ok(Self::Documentation),
            "security" => Ok(Self::Security),
            "database" | "db" => Ok(Self::Database),
            other => Err(format!("unknown agent role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_names() {
        let names: Vec<_> = AgentRole::ALL.iter().map(|r| r.profile().name).collect();
        assert_eq!(
            names,
            vec![
                "BackendExpert",
                "FrontendExpert",
                "QAExpert",
                "DocExpert",
                "SecurityExpert",
                "DatabaseExpert"
            ]
        );
    }

    #[test]
    fn test_instructions_document_change_format() {
        for role in AgentRole::ALL {
            let instructions = role.profile().instructions;
            assert!(instructions.contains("FILE: "), "{role} is missing FILE marker");
            assert!(instructions.contains("ACTION: create|modify|delete"));
            assert!(!role.profile().capabilities.is_empty());
        }
    }

    #[test]
    fn test_parse_roundtrip_and_aliases() {
        for role in AgentRole::ALL {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
        }
        assert_eq!("QA".parse::<AgentRole>().unwrap(), AgentRole::Tester);
        assert!("designer".parse::<AgentRole>().is_err());
    }
}
