//! Retention rotation of old archives.

use crate::archive::{ARCHIVE_PREFIX, ARCHIVE_SUFFIX};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Outcome of a rotation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    /// Archives that survived, newest first
    pub kept: Vec<PathBuf>,

    /// Archives deleted
    pub removed: Vec<PathBuf>,

    /// Archives that could not be deleted, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

fn archive_matcher() -> Option<GlobMatcher> {
    let pattern = format!("{}*{}", ARCHIVE_PREFIX, ARCHIVE_SUFFIX);
    match Glob::new(&pattern) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!("Invalid archive pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Splits an archive file name into its timestamp stem and same-second
/// counter. A name without a counter is run 0.
fn run_key(path: &Path) -> (String, u64) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name
        .strip_prefix(ARCHIVE_PREFIX)
        .and_then(|rest| rest.strip_suffix(ARCHIVE_SUFFIX))
        .unwrap_or(&name);

    // YYYY-MM-DD-HHMMSS has three dashes; a fourth introduces the counter
    match stem.match_indices('-').nth(3) {
        Some((idx, _)) => match stem[idx + 1..].parse::<u64>() {
            Ok(counter) => (stem[..idx].to_string(), counter),
            Err(_) => (stem.to_string(), 0),
        },
        None => (stem.to_string(), 0),
    }
}

/// Archives in `output_dir`, newest first.
///
/// Ordering is by modification time, ties broken by the timestamp in the
/// name and then the same-second counter (all descending). A file whose
/// mtime cannot be read sorts as the oldest.
pub fn list_archives(output_dir: &Path) -> Vec<PathBuf> {
    let Some(matcher) = archive_matcher() else {
        return Vec::new();
    };
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {}: {}", output_dir.display(), e);
            return Vec::new();
        }
    };

    let mut archives: Vec<(SystemTime, (String, u64), PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| matcher.is_match(entry.file_name()))
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(UNIX_EPOCH);
            let path = entry.path();
            (modified, run_key(&path), path)
        })
        .collect();

    archives.sort_by(|a, b| b.cmp(a));
    archives.into_iter().map(|(_, _, path)| path).collect()
}

/// Keeps the `keep` most recent archives in `output_dir` and deletes the rest.
///
/// `keep == 0` disables rotation.
pub fn rotate(output_dir: &Path, keep: usize) -> RotationReport {
    let mut report = RotationReport::default();
    if keep == 0 || !output_dir.is_dir() {
        return report;
    }

    let mut archives = list_archives(output_dir);
    let excess = archives.split_off(keep.min(archives.len()));
    report.kept = archives;

    for path in excess {
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Rotated out old backup: {}", path.display());
                report.removed.push(path);
            }
            Err(e) => {
                warn!("Could not remove old backup {}: {}", path.display(), e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_keeps_most_recent() {
        let temp = TempDir::new().unwrap();
        let old = touch(temp.path(), "openclaw-backup-2025-01-01-000000.tar.gz", 300);
        let mid = touch(temp.path(), "openclaw-backup-2025-01-02-000000.tar.gz", 200);
        let new = touch(temp.path(), "openclaw-backup-2025-01-03-000000.tar.gz", 100);

        let report = rotate(temp.path(), 2);

        assert_eq!(report.kept, vec![new.clone(), mid.clone()]);
        assert_eq!(report.removed, vec![old.clone()]);
        assert!(report.failed.is_empty());
        assert!(!old.exists());
        assert!(mid.exists() && new.exists());
    }

    #[test]
    fn test_mtime_wins_over_name() {
        let temp = TempDir::new().unwrap();
        let renamed = touch(temp.path(), "openclaw-backup-2020-01-01-000000.tar.gz", 10);
        let stale = touch(temp.path(), "openclaw-backup-2030-01-01-000000.tar.gz", 1000);

        let report = rotate(temp.path(), 1);

        assert_eq!(report.kept, vec![renamed]);
        assert_eq!(report.removed, vec![stale]);
    }

    #[test]
    fn test_same_mtime_orders_by_run_counter() {
        let temp = TempDir::new().unwrap();
        let first = touch(temp.path(), "openclaw-backup-2025-01-15-120000.tar.gz", 0);
        let second = touch(temp.path(), "openclaw-backup-2025-01-15-120000-1.tar.gz", 0);
        let ninth = touch(temp.path(), "openclaw-backup-2025-01-15-120000-9.tar.gz", 0);
        let tenth = touch(temp.path(), "openclaw-backup-2025-01-15-120000-10.tar.gz", 0);
        let stamp = SystemTime::now();
        for path in [&first, &second, &ninth, &tenth] {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(stamp)
                .unwrap();
        }

        assert_eq!(
            list_archives(temp.path()),
            vec![tenth.clone(), ninth.clone(), second.clone(), first.clone()]
        );

        let report = rotate(temp.path(), 1);
        assert_eq!(report.kept, vec![tenth]);
        assert_eq!(report.removed, vec![ninth, second, first]);
    }

    #[test]
    fn test_run_key_parses_counter() {
        assert_eq!(
            run_key(Path::new("openclaw-backup-2025-01-15-120000.tar.gz")),
            ("2025-01-15-120000".to_string(), 0)
        );
        assert_eq!(
            run_key(Path::new("/out/openclaw-backup-2025-01-15-120000-10.tar.gz")),
            ("2025-01-15-120000".to_string(), 10)
        );
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let temp = TempDir::new().unwrap();
        let notes = touch(temp.path(), "notes.tar.gz", 1000);
        let other = touch(temp.path(), "openclaw-backup.zip", 1000);
        fs::create_dir(temp.path().join("openclaw-backup-dir.tar.gz")).unwrap();
        let archive = touch(temp.path(), "openclaw-backup-2025-01-01-000000-1.tar.gz", 10);

        let report = rotate(temp.path(), 1);

        assert_eq!(report.kept, vec![archive]);
        assert!(report.removed.is_empty());
        assert!(notes.exists() && other.exists());
    }

    #[test]
    fn test_zero_keep_is_noop() {
        let temp = TempDir::new().unwrap();
        let a = touch(temp.path(), "openclaw-backup-2025-01-01-000000.tar.gz", 100);

        assert_eq!(rotate(temp.path(), 0), RotationReport::default());
        assert!(a.exists());
    }

    #[test]
    fn test_missing_directory_is_noop() {
        let temp = TempDir::new().unwrap();
        let report = rotate(&temp.path().join("absent"), 3);
        assert_eq!(report, RotationReport::default());
    }

    #[test]
    fn test_keep_larger_than_count() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "openclaw-backup-2025-01-01-000000.tar.gz", 100);

        let report = rotate(temp.path(), 10);
        assert_eq!(report.kept.len(), 1);
        assert!(report.removed.is_empty());
    }
}
