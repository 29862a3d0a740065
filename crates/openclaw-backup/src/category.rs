//! Backup categories and mode resolution.
//!
//! Every category is a closed enum variant bound to its collection rule:
//! - glob categories: vault files matched relative to the project base directory
//! - `config`: a fixed list of home and project settings files
//! - `sessions`: every file under the resolved agent sessions directory

use crate::error::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How important a category is to recovering a working setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "Critical"),
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
        }
    }
}

/// How files for a category are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRule {
    /// Patterns relative to the project base directory
    Glob(&'static [&'static str]),

    /// Fixed home-level and project-level settings files
    ConfigFiles,

    /// The resolved agent sessions directory
    SessionLogs,
}

/// A named group of files with its own collection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Memory,
    People,
    Knowledge,
    Goals,
    Decisions,
    Playbooks,
    Threads,
    Config,
    Sessions,
}

impl Category {
    /// Every category, in registry order.
    pub const ALL: [Category; 9] = [
        Category::Memory,
        Category::People,
        Category::Knowledge,
        Category::Goals,
        Category::Decisions,
        Category::Playbooks,
        Category::Threads,
        Category::Config,
        Category::Sessions,
    ];

    /// Categories covering vault content.
    pub const VAULT: [Category; 7] = [
        Category::Memory,
        Category::People,
        Category::Knowledge,
        Category::Goals,
        Category::Decisions,
        Category::Playbooks,
        Category::Threads,
    ];

    /// Identifier used on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Category::Memory => "memory",
            Category::People => "people",
            Category::Knowledge => "knowledge",
            Category::Goals => "goals",
            Category::Decisions => "decisions",
            Category::Playbooks => "playbooks",
            Category::Threads => "threads",
            Category::Config => "config",
            Category::Sessions => "sessions",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Memory => "Memory files",
            Category::People => "People files",
            Category::Knowledge => "Knowledge base",
            Category::Goals => "Goals",
            Category::Decisions => "Decision journal",
            Category::Playbooks => "Playbooks",
            Category::Threads => "Thread state",
            Category::Config => "Config files",
            Category::Sessions => "Session logs",
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            Category::Memory | Category::People | Category::Knowledge | Category::Goals => {
                Priority::Critical
            }
            Category::Decisions | Category::Playbooks | Category::Config | Category::Sessions => {
                Priority::High
            }
            Category::Threads => Priority::Medium,
        }
    }

    /// The collection rule bound to this category.
    pub fn rule(&self) -> CollectionRule {
        match self {
            Category::Memory => CollectionRule::Glob(&["memory/*.md"]),
            Category::People => CollectionRule::Glob(&["memory/people/*.md"]),
            Category::Knowledge => CollectionRule::Glob(&["memory/knowledge/*.md"]),
            Category::Goals => CollectionRule::Glob(&["memory/goals.md"]),
            Category::Decisions => CollectionRule::Glob(&["memory/decisions/*.md"]),
            Category::Playbooks => CollectionRule::Glob(&["memory/playbooks/*.md"]),
            Category::Threads => CollectionRule::Glob(&["memory/threads/*.md"]),
            Category::Config => CollectionRule::ConfigFiles,
            Category::Sessions => CollectionRule::SessionLogs,
        }
    }

    /// Glob patterns for this category; empty for procedural categories.
    pub fn patterns(&self) -> &'static [&'static str] {
        match self.rule() {
            CollectionRule::Glob(patterns) => patterns,
            CollectionRule::ConfigFiles | CollectionRule::SessionLogs => &[],
        }
    }

    /// Comma-separated list of every identifier, for error messages.
    pub fn available() -> String {
        Category::ALL
            .iter()
            .map(|c| c.id())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Category {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| BackupError::UnknownCategories {
                unknown: vec![s.to_string()],
            })
    }
}

/// Which set of categories a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupMode {
    /// Every category
    #[default]
    Full,

    /// Vault content only
    Memory,

    /// Session logs only
    Sessions,

    /// An explicit include list
    Selective,
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupMode::Full => write!(f, "full"),
            BackupMode::Memory => write!(f, "memory"),
            BackupMode::Sessions => write!(f, "sessions"),
            BackupMode::Selective => write!(f, "selective"),
        }
    }
}

/// Resolves a mode (and, for selective mode, an include list such as
/// `"people, knowledge"`) into an ordered category list.
///
/// Unknown identifiers fail the whole resolution; nothing is collected.
pub fn resolve_categories(mode: BackupMode, include: Option<&str>) -> Result<Vec<Category>> {
    match mode {
        BackupMode::Full => Ok(Category::ALL.to_vec()),
        BackupMode::Memory => Ok(Category::VAULT.to_vec()),
        BackupMode::Sessions => Ok(vec![Category::Sessions]),
        BackupMode::Selective => {
            let include = include
                .filter(|s| !s.trim().is_empty())
                .ok_or(BackupError::MissingInclude)?;

            let mut categories = Vec::new();
            let mut unknown = Vec::new();
            for raw in include.split(',').map(str::trim) {
                match raw.parse::<Category>() {
                    Ok(category) => categories.push(category),
                    Err(_) => unknown.push(raw.to_string()),
                }
            }

            if !unknown.is_empty() {
                return Err(BackupError::UnknownCategories { unknown });
            }
            Ok(categories)
        }
    }
}

/// Label recorded in the archive metadata for a run.
pub fn run_label(mode: BackupMode, categories: &[Category]) -> String {
    match mode {
        BackupMode::Selective => {
            let ids: Vec<&str> = categories.iter().map(|c| c.id()).collect();
            format!("selective ({})", ids.join(", "))
        }
        other => other.to_string(),
    }
}
