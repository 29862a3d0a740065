//! File collection across the project, home config, and sessions roots.
//!
//! Collection is a fold over the requested categories: each category adds
//! `(source, archive path)` pairs to a [`Collection`], which owns the set of
//! archive paths already claimed. The first claim of a path wins.

use crate::category::{Category, CollectionRule};
use crate::error::{BackupError, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use globset::{GlobBuilder, GlobMatcher};
use openclaw_core::OpenClawPaths;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Archive prefix for config files.
pub const CONFIG_PREFIX: &str = "config";

/// Archive prefix for session logs.
pub const SESSIONS_PREFIX: &str = "sessions";

/// Extension of session log files subject to the since filter.
pub const SESSION_LOG_EXTENSION: &str = "jsonl";

/// Project-level config file copied alongside the home settings.
pub const PROJECT_CONFIG_FILE: &str = "openclaw.mjs";

/// Home-level config files under ~/.openclaw.
pub const HOME_CONFIG_FILES: &[&str] = &["config.json", "settings.json"];

/// One file selected for backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// Absolute path of the source file
    pub source: PathBuf,

    /// Path inside the archive, `/`-separated
    pub archive_path: String,
}

impl CollectedFile {
    /// Top-level prefix of the archive path (text before the first `/`).
    pub fn prefix(&self) -> &str {
        archive_prefix(&self.archive_path)
    }
}

/// Returns the text before the first `/` of an archive path.
pub fn archive_prefix(archive_path: &str) -> &str {
    archive_path
        .split_once('/')
        .map(|(head, _)| head)
        .unwrap_or(archive_path)
}

/// Accumulated result of a collection pass.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    files: Vec<CollectedFile>,
    seen: HashSet<String>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file unless its archive path was already claimed.
    /// Returns whether the file was added.
    pub fn insert(&mut self, source: PathBuf, archive_path: String) -> bool {
        if !self.seen.insert(archive_path.clone()) {
            debug!("Dropping duplicate archive path: {}", archive_path);
            return false;
        }
        self.files.push(CollectedFile {
            source,
            archive_path,
        });
        true
    }

    pub fn files(&self) -> &[CollectedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File count per top-level archive prefix.
    pub fn prefix_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            *counts.entry(file.prefix().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Only session logs modified at or after this instant are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinceCutoff(DateTime<Local>);

impl SinceCutoff {
    /// Parses a `YYYY-MM-DD` date as local midnight.
    pub fn parse(value: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| BackupError::invalid_date(value))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| BackupError::invalid_date(value))?;
        let local = Local
            .from_local_datetime(&midnight)
            .earliest()
            .ok_or_else(|| BackupError::invalid_date(value))?;
        Ok(Self(local))
    }

    pub fn from_datetime(at: DateTime<Local>) -> Self {
        Self(at)
    }

    pub fn as_datetime(&self) -> DateTime<Local> {
        self.0
    }

    /// True when a file modified at `modified` passes the filter.
    pub fn includes(&self, modified: SystemTime) -> bool {
        DateTime::<Local>::from(modified) >= self.0
    }
}

/// Collects files for `categories`, in order, from the roots in `paths`.
pub fn collect(
    paths: &OpenClawPaths,
    categories: &[Category],
    since: Option<SinceCutoff>,
) -> Collection {
    categories.iter().fold(Collection::new(), |acc, category| {
        let before = acc.len();
        let acc = collect_category(acc, paths, *category, since);
        debug!("{}: {} file(s)", category.id(), acc.len() - before);
        acc
    })
}

fn collect_category(
    acc: Collection,
    paths: &OpenClawPaths,
    category: Category,
    since: Option<SinceCutoff>,
) -> Collection {
    match category.rule() {
        CollectionRule::Glob(patterns) => patterns
            .iter()
            .fold(acc, |acc, pattern| collect_pattern(acc, &paths.base_dir, pattern)),
        CollectionRule::ConfigFiles => collect_config(acc, paths),
        CollectionRule::SessionLogs => match &paths.sessions_dir {
            Some(dir) => collect_sessions(acc, dir, since),
            None => {
                info!("No agent sessions directory found; skipping session logs");
                acc
            }
        },
    }
}

/// Collects direct children of `base_dir/<pattern parent>` whose file name
/// matches the final pattern component.
fn collect_pattern(mut acc: Collection, base_dir: &Path, pattern: &str) -> Collection {
    let pattern_path = Path::new(pattern);
    let Some(name_glob) = pattern_path.file_name().and_then(|n| n.to_str()) else {
        warn!("Ignoring malformed pattern: {}", pattern);
        return acc;
    };
    let parent = base_dir.join(pattern_path.parent().unwrap_or(Path::new("")));
    if !parent.is_dir() {
        debug!("Skipping non-existent directory: {}", parent.display());
        return acc;
    }

    let matcher = match compile_name_glob(name_glob) {
        Ok(m) => m,
        Err(e) => {
            warn!("Invalid pattern '{}': {}", pattern, e);
            return acc;
        }
    };

    let include_hidden = name_glob.starts_with('.');
    let walker = WalkDir::new(&parent)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Could not read entry under {}: {}", parent.display(), e);
                continue;
            }
        };
        if !include_hidden && is_hidden(entry.file_name()) {
            continue;
        }
        if !matcher.is_match(entry.file_name()) || !entry.path().is_file() {
            continue;
        }
        let Some(archive_path) = entry
            .path()
            .strip_prefix(base_dir)
            .ok()
            .and_then(to_archive_path)
        else {
            warn!("Skipping file with non-UTF-8 path: {}", entry.path().display());
            continue;
        };
        acc.insert(entry.path().to_path_buf(), archive_path);
    }

    acc
}

/// Dot-files are only matched by patterns that themselves start with `.`.
fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

fn compile_name_glob(name_glob: &str) -> std::result::Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(name_glob)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

fn collect_config(mut acc: Collection, paths: &OpenClawPaths) -> Collection {
    let candidates = HOME_CONFIG_FILES
        .iter()
        .map(|name| paths.openclaw_dir.join(name))
        .chain(std::iter::once(paths.base_dir.join(PROJECT_CONFIG_FILE)));

    for candidate in candidates {
        if !candidate.is_file() {
            continue;
        }
        let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let archive_path = format!("{}/{}", CONFIG_PREFIX, name);
        acc.insert(candidate, archive_path);
    }

    acc
}

fn collect_sessions(
    mut acc: Collection,
    sessions_dir: &Path,
    since: Option<SinceCutoff>,
) -> Collection {
    if !sessions_dir.is_dir() {
        info!(
            "Sessions directory {} does not exist; skipping session logs",
            sessions_dir.display()
        );
        return acc;
    }

    for entry in WalkDir::new(sessions_dir).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Could not read entry under {}: {}", sessions_dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if let Some(cutoff) = since {
            if is_session_log(path) && !modified_since(path, cutoff) {
                continue;
            }
        }

        let Some(relative) = path.strip_prefix(sessions_dir).ok().and_then(to_archive_path)
        else {
            warn!("Skipping file with non-UTF-8 path: {}", path.display());
            continue;
        };
        acc.insert(path.to_path_buf(), format!("{}/{}", SESSIONS_PREFIX, relative));
    }

    acc
}

fn is_session_log(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SESSION_LOG_EXTENSION)
}

/// Files whose modification time cannot be read are excluded.
fn modified_since(path: &Path, cutoff: SinceCutoff) -> bool {
    match path.metadata().and_then(|m| m.modified()) {
        Ok(modified) => cutoff.includes(modified),
        Err(e) => {
            debug!("Cannot read mtime of {}: {}", path.display(), e);
            false
        }
    }
}

/// Joins the normal components of a relative path with `/`.
fn to_archive_path(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
