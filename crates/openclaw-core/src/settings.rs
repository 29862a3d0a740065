//! Backup settings with layered precedence
//!
//! Loads settings from the following sources (low to high):
//! 1. Built-in defaults (every field unset)
//! 2. Settings file (~/.openclaw/backup.yaml, or an explicit path)
//! 3. Environment variables (OPENCLAW_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::utils::get_openclaw_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default settings file name inside ~/.openclaw
pub const SETTINGS_FILENAME: &str = "backup.yaml";

/// Environment variable overriding the output directory
pub const ENV_OUTPUT: &str = "OPENCLAW_BACKUP_OUTPUT";
/// Environment variable overriding the retention count
pub const ENV_KEEP: &str = "OPENCLAW_BACKUP_KEEP";
/// Environment variable overriding the project base directory
pub const ENV_BASE_DIR: &str = "OPENCLAW_BASE_DIR";
/// Environment variable overriding the sessions directory
pub const ENV_SESSIONS_DIR: &str = "OPENCLAW_SESSIONS_DIR";
/// Environment variable overriding the gzip level
pub const ENV_COMPRESSION: &str = "OPENCLAW_BACKUP_COMPRESSION";

/// User-tunable backup settings. Unset fields fall through to CLI defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupSettings {
    /// Directory where archives are written
    pub output_dir: Option<PathBuf>,

    /// Number of archives to retain (0 or less keeps all)
    pub keep: Option<i64>,

    /// Project base directory
    pub base_dir: Option<PathBuf>,

    /// Sessions directory, bypassing agent discovery
    pub sessions_dir: Option<PathBuf>,

    /// Gzip compression level (1-9)
    pub compression_level: Option<u32>,
}

impl BackupSettings {
    /// Overlays `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: BackupSettings) -> BackupSettings {
        BackupSettings {
            output_dir: other.output_dir.or(self.output_dir),
            keep: other.keep.or(self.keep),
            base_dir: other.base_dir.or(self.base_dir),
            sessions_dir: other.sessions_dir.or(self.sessions_dir),
            compression_level: other.compression_level.or(self.compression_level),
        }
    }
}

/// Loader for [`BackupSettings`]
pub struct SettingsLoader {
    path: PathBuf,
    required: bool,
}

impl SettingsLoader {
    /// Loader for the default settings file (~/.openclaw/backup.yaml).
    /// A missing file is not an error.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: get_openclaw_dir()?.join(SETTINGS_FILENAME),
            required: false,
        })
    }

    /// Loader for an explicit settings file, which must exist.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// Path this loader reads from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from the file and the process environment.
    pub fn load(&self) -> Result<BackupSettings> {
        let from_file = self.load_file()?;
        let from_env = settings_from_env(|key| std::env::var(key).ok())?;
        Ok(from_file.merge(from_env))
    }

    fn load_file(&self) -> Result<BackupSettings> {
        if !self.path.is_file() {
            if self.required {
                return Err(Error::invalid_settings(format!(
                    "Settings file not found: {}",
                    self.path.display()
                )));
            }
            debug!("No settings file at {}", self.path.display());
            return Ok(BackupSettings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BackupSettings::default());
        }

        let settings: BackupSettings = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::yaml_parse(self.path.display().to_string(), e))?;

        if let Some(level) = settings.compression_level {
            validate_compression_level(level)?;
        }

        debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }
}

/// Builds settings from environment variables using `lookup`.
fn settings_from_env<F>(lookup: F) -> Result<BackupSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let keep = match non_empty(ENV_KEEP) {
        Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| {
            Error::invalid_settings(format!("{} must be an integer, got '{}'", ENV_KEEP, raw))
        })?),
        None => None,
    };

    let compression_level = match non_empty(ENV_COMPRESSION) {
        Some(raw) => {
            let level = raw.trim().parse::<u32>().map_err(|_| {
                Error::invalid_settings(format!("{} must be 1-9, got '{}'", ENV_COMPRESSION, raw))
            })?;
            validate_compression_level(level)?;
            Some(level)
        }
        None => None,
    };

    Ok(BackupSettings {
        output_dir: non_empty(ENV_OUTPUT).map(PathBuf::from),
        keep,
        base_dir: non_empty(ENV_BASE_DIR).map(PathBuf::from),
        sessions_dir: non_empty(ENV_SESSIONS_DIR).map(PathBuf::from),
        compression_level,
    })
}

/// Checks that a gzip level is within 1-9.
pub fn validate_compression_level(level: u32) -> Result<()> {
    if (1..=9).contains(&level) {
        Ok(())
    } else {
        Err(Error::invalid_settings(format!(
            "Compression level must be 1-9, got {}",
            level
        )))
    }
}
