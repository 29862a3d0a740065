//! Filesystem roots used by backup and restore.
//!
//! A backup draws from three independent roots:
//! - the project base directory (vault content, `openclaw.mjs`)
//! - the home configuration directory (`~/.openclaw`)
//! - the sessions directory of one agent (`~/.openclaw/agents/<agent>/sessions`)
//!
//! [`OpenClawPaths`] resolves them once per run and is passed explicitly to
//! collection and restore.

use crate::error::Result;
use crate::utils::get_openclaw_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory under the OpenClaw home that holds one folder per agent.
pub const AGENTS_DIR_NAME: &str = "agents";

/// Folder inside an agent directory that holds its session logs.
pub const SESSIONS_DIR_NAME: &str = "sessions";

/// Outcome of looking for an agent sessions directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionsResolution {
    /// The directory that was selected, if any
    pub selected: Option<PathBuf>,

    /// Every agent sessions directory that was found, in enumeration order
    pub candidates: Vec<PathBuf>,
}

impl SessionsResolution {
    /// True when more than one agent directory could have been selected.
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Resolved roots for one backup or restore run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenClawPaths {
    /// Project base directory
    pub base_dir: PathBuf,

    /// Home configuration directory (~/.openclaw)
    pub openclaw_dir: PathBuf,

    /// Agent sessions directory, `None` when it could not be located
    pub sessions_dir: Option<PathBuf>,
}

impl OpenClawPaths {
    /// Creates a path context from already-resolved roots.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        openclaw_dir: impl Into<PathBuf>,
        sessions_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            openclaw_dir: openclaw_dir.into(),
            sessions_dir,
        }
    }

    /// Resolves all roots from the environment.
    ///
    /// Explicit overrides win; otherwise the base directory is discovered from
    /// the working directory and the sessions directory from the agents folder.
    pub fn discover(base_override: Option<&Path>, sessions_override: Option<&Path>) -> Result<Self> {
        let openclaw_dir = get_openclaw_dir()?;

        let base_dir = match base_override {
            Some(dir) => dir.to_path_buf(),
            None => resolve_base_dir(&std::env::current_dir()?),
        };

        let sessions_dir = match sessions_override {
            Some(dir) => Some(dir.to_path_buf()),
            None => {
                let resolution = resolve_sessions_dir(&openclaw_dir.join(AGENTS_DIR_NAME));
                report_ambiguity(&resolution);
                resolution.selected
            }
        };

        debug!(
            "Resolved roots: base={}, openclaw={}, sessions={:?}",
            base_dir.display(),
            openclaw_dir.display(),
            sessions_dir
        );

        Ok(Self {
            base_dir,
            openclaw_dir,
            sessions_dir,
        })
    }
}

/// Finds the project root: the nearest ancestor of `start` holding both a
/// `skills/` directory and a `package.json` file. Falls back to `start`.
pub fn resolve_base_dir(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join("skills").is_dir() && dir.join("package.json").is_file())
        .unwrap_or(start)
        .to_path_buf()
}

/// Looks for `<agents_root>/<agent>/sessions` directories.
///
/// The first candidate in directory enumeration order is selected. That order
/// is filesystem-defined, so when several agents exist the choice is not
/// stable across machines; callers should surface [`SessionsResolution::is_ambiguous`].
pub fn resolve_sessions_dir(agents_root: &Path) -> SessionsResolution {
    let entries = match fs::read_dir(agents_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No agents directory at {}: {}", agents_root.display(), e);
            return SessionsResolution::default();
        }
    };

    let candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|agent_dir| agent_dir.is_dir())
        .map(|agent_dir| agent_dir.join(SESSIONS_DIR_NAME))
        .filter(|sessions| sessions.is_dir())
        .collect();

    SessionsResolution {
        selected: candidates.first().cloned(),
        candidates,
    }
}

fn report_ambiguity(resolution: &SessionsResolution) {
    if !resolution.is_ambiguous() {
        return;
    }
    let listed: Vec<String> = resolution
        .candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    if let Some(selected) = &resolution.selected {
        warn!(
            "Multiple agent sessions directories found ({}); using {} (enumeration order). \
             Pass --sessions-dir to choose explicitly.",
            listed.join(", "),
            selected.display()
        );
    }
}
