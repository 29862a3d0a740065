//! CLI command implementations

pub mod backup;
pub mod categories;
pub mod restore;
pub mod verify;

use anyhow::{Context, Result};
use camino::Utf8Path;
use openclaw_core::{expand_tilde, BackupSettings, OpenClawPaths, SettingsLoader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads settings from `--settings FILE` or the default location, layered
/// with environment overrides.
pub fn load_settings(settings_file: Option<&Utf8Path>) -> Result<BackupSettings> {
    let loader = match settings_file {
        Some(path) => SettingsLoader::with_file(path.as_std_path()),
        None => SettingsLoader::new()?,
    };

    let settings = loader
        .load()
        .with_context(|| format!("Failed to load settings from {}", loader.path().display()))?;
    debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

/// Picks the flag value, then the settings value, and expands `~`.
pub fn pick_path(flag: Option<&Utf8Path>, setting: Option<&Path>) -> Result<Option<PathBuf>> {
    let chosen = flag.map(Utf8Path::as_std_path).or(setting);
    chosen.map(expand_tilde).transpose().map_err(Into::into)
}

/// Resolves the project, home config, and sessions roots.
pub fn resolve_paths(
    settings: &BackupSettings,
    base_dir: Option<&Utf8Path>,
    sessions_dir: Option<&Utf8Path>,
) -> Result<OpenClawPaths> {
    let base = pick_path(base_dir, settings.base_dir.as_deref())?;
    let sessions = pick_path(sessions_dir, settings.sessions_dir.as_deref())?;

    OpenClawPaths::discover(base.as_deref(), sessions.as_deref())
        .context("Failed to resolve OpenClaw directories")
}
