//! Archive creation for backups.
//!
//! This module packs collected files into a timestamped tar.gz archive and
//! appends the manifest and run metadata as in-memory members.

use crate::collector::CollectedFile;
use crate::error::{BackupError, Result};
use crate::manifest::{Manifest, RunMetadata, MANIFEST_FILENAME, META_FILENAME};
use crate::progress::BackupProgress;
use chrono::{Local, NaiveDateTime};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tar::{Builder as TarBuilder, Header};
use tracing::{debug, info, warn};

/// Default compression level (6 = balanced speed/ratio).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// File name prefix of every archive.
pub const ARCHIVE_PREFIX: &str = "openclaw-backup-";

/// File name suffix of every archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Timestamp embedded in archive names (one-second resolution).
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Result of a backup operation.
#[derive(Debug, Clone)]
pub struct BackupResult {
    /// Path to the created archive
    pub archive_path: PathBuf,

    /// Size of the archive in bytes
    pub size_bytes: u64,

    /// Number of payload files included
    pub file_count: usize,

    /// Manifest embedded in the archive
    pub manifest: Manifest,

    /// Metadata embedded in the archive
    pub metadata: RunMetadata,

    /// Per-file problems that did not stop the backup
    pub warnings: Vec<String>,

    /// Duration of the operation in seconds
    pub duration_seconds: f64,
}

/// Configuration for archive creation.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Label recorded in the run metadata
    pub label: String,

    /// Compression level (1-9)
    pub compression_level: u32,

    /// Whether to show progress
    pub show_progress: bool,
}

impl ArchiveConfig {
    /// Creates a new archive configuration.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            show_progress: false,
        }
    }

    /// Sets the compression level.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.clamp(1, 9);
        self
    }

    /// Sets whether to show progress.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

/// Archive file name for a given local timestamp.
pub fn archive_filename(timestamp: &NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        ARCHIVE_PREFIX,
        timestamp.format(ARCHIVE_TIMESTAMP_FORMAT),
        ARCHIVE_SUFFIX
    )
}

/// Picks an archive path in `output_dir` that does not exist yet.
///
/// Two runs within the same second would share a name; later runs get a
/// numeric suffix (`...-HHMMSS-1.tar.gz`) instead of overwriting.
fn unique_archive_path(output_dir: &Path, timestamp: &NaiveDateTime) -> PathBuf {
    let first = output_dir.join(archive_filename(timestamp));
    if !first.exists() {
        return first;
    }

    let stem = format!(
        "{}{}",
        ARCHIVE_PREFIX,
        timestamp.format(ARCHIVE_TIMESTAMP_FORMAT)
    );
    (1u32..)
        .map(|n| output_dir.join(format!("{}-{}{}", stem, n, ARCHIVE_SUFFIX)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Archive builder for creating backups.
pub struct ArchiveBuilder {
    config: ArchiveConfig,
}

impl ArchiveBuilder {
    /// Creates a new archive builder.
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Creates a backup archive of `files` inside `output_dir`.
    pub fn create(&self, output_dir: &Path, files: &[CollectedFile]) -> Result<BackupResult> {
        if files.is_empty() {
            return Err(BackupError::EmptyCollection);
        }

        let start_time = Instant::now();
        let mut progress = self.config.show_progress.then(BackupProgress::new);

        fs::create_dir_all(output_dir)?;
        let archive_path = unique_archive_path(output_dir, &Local::now().naive_local());

        info!(
            "Creating {} backup: {} ({} files)",
            self.config.label,
            archive_path.display(),
            files.len()
        );

        if let Some(ref mut progress) = progress {
            progress.start_hash(files.len() as u64, "Hashing files...");
        }
        let mut manifest = Manifest::build_with(files, || {
            if let Some(ref progress) = progress {
                progress.inc_hash();
            }
        });
        let mut warnings: Vec<String> = manifest
            .unreadable()
            .map(|path| format!("Could not read {} while hashing", path))
            .collect();
        if let Some(ref progress) = progress {
            progress.finish_hash(&format!("Hashed {} files", files.len()));
        }

        let metadata = match self.write_tar(
            &archive_path,
            files,
            &mut manifest,
            &mut warnings,
            &mut progress,
        ) {
            Ok(metadata) => metadata,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&archive_path) {
                    debug!("Could not remove partial archive: {}", cleanup);
                }
                return Err(e);
            }
        };

        if let Some(ref progress) = progress {
            progress.finish_all();
        }

        let size_bytes = fs::metadata(&archive_path)?.len();
        let duration_seconds = start_time.elapsed().as_secs_f64();

        info!(
            "Backup complete: {} files, {} bytes in {:.2}s",
            metadata.file_count, size_bytes, duration_seconds
        );

        Ok(BackupResult {
            archive_path,
            size_bytes,
            file_count: metadata.file_count,
            manifest,
            metadata,
            warnings,
            duration_seconds,
        })
    }

    /// Writes the tar.gz stream. Files that cannot be added are dropped from
    /// the manifest and reported as warnings.
    fn write_tar(
        &self,
        archive_path: &Path,
        files: &[CollectedFile],
        manifest: &mut Manifest,
        warnings: &mut Vec<String>,
        progress: &mut Option<BackupProgress>,
    ) -> Result<RunMetadata> {
        let file = File::create(archive_path)?;
        let encoder = GzEncoder::new(
            BufWriter::new(file),
            Compression::new(self.config.compression_level),
        );
        let mut tar = TarBuilder::new(encoder);

        if let Some(progress) = progress.as_mut() {
            progress.start_archive(files.len() as u64, "Creating archive...");
        }

        let mut added: Vec<&str> = Vec::with_capacity(files.len());
        for file in files {
            match tar.append_path_with_name(&file.source, &file.archive_path) {
                Ok(()) => {
                    debug!("Added {}", file.archive_path);
                    added.push(&file.archive_path);
                }
                Err(e) => {
                    warn!("Could not add {}: {}", file.archive_path, e);
                    warnings.push(format!("Could not add {}: {}", file.archive_path, e));
                    manifest.remove(&file.archive_path);
                }
            }

            if let Some(progress) = progress.as_ref() {
                progress.inc_archive();
            }
        }

        let metadata = RunMetadata::new(&self.config.label, added.iter().copied());

        append_bytes(&mut tar, MANIFEST_FILENAME, manifest.to_json()?.as_bytes())?;
        append_bytes(&mut tar, META_FILENAME, metadata.to_json()?.as_bytes())?;

        let mut writer = tar.into_inner()?.finish()?;
        writer.flush()?;

        if let Some(progress) = progress.as_ref() {
            progress.finish_archive(&format!("Added {} files to archive", added.len()));
        }

        Ok(metadata)
    }
}

/// Appends an in-memory member.
fn append_bytes<W: Write>(tar: &mut TarBuilder<W>, name: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(Local::now().timestamp().max(0) as u64);
    header.set_entry_type(tar::EntryType::Regular);
    tar.append_data(&mut header, name, data)?;
    Ok(())
}

/// Packs `files` into a new archive in `output_dir` with default settings.
pub fn write_archive(output_dir: &Path, files: &[CollectedFile], label: &str) -> Result<BackupResult> {
    ArchiveBuilder::new(ArchiveConfig::new(label)).create(output_dir, files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::sha256_file;
    use crate::manifest::FileDigest;
    use chrono::NaiveDate;
    use flate2::read::GzDecoder;
    use std::collections::BTreeMap;
    use std::io::Read;
    use tempfile::TempDir;

    fn sample_files(dir: &Path) -> Vec<CollectedFile> {
        fs::create_dir_all(dir.join("memory/people")).unwrap();
        fs::write(dir.join("memory/goals.md"), "# Goals\n").unwrap();
        fs::write(dir.join("memory/people/ada.md"), "Ada Lovelace").unwrap();

        vec![
            CollectedFile {
                source: dir.join("memory/goals.md"),
                archive_path: "memory/goals.md".to_string(),
            },
            CollectedFile {
                source: dir.join("memory/people/ada.md"),
                archive_path: "memory/people/ada.md".to_string(),
            },
        ]
    }

    fn read_members(archive: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut members = BTreeMap::new();
        let mut tar = tar::Archive::new(GzDecoder::new(File::open(archive).unwrap()));
        for entry in tar.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            members.insert(name, data);
        }
        members
    }

    #[test]
    fn test_archive_filename() {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 5)
            .unwrap();
        assert_eq!(archive_filename(&ts), "openclaw-backup-2025-01-15-120005.tar.gz");
    }

    #[test]
    fn test_unique_archive_path_adds_suffix() {
        let temp = TempDir::new().unwrap();
        let ts = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let first = unique_archive_path(temp.path(), &ts);
        assert_eq!(
            first.file_name().unwrap(),
            "openclaw-backup-2025-01-15-120000.tar.gz"
        );
        fs::write(&first, b"").unwrap();

        let second = unique_archive_path(temp.path(), &ts);
        assert_eq!(
            second.file_name().unwrap(),
            "openclaw-backup-2025-01-15-120000-1.tar.gz"
        );
    }

    #[test]
    fn test_archive_creation() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = sample_files(source.path());

        let result = write_archive(&output.path().join("nested/out"), &files, "memory").unwrap();

        assert!(result.archive_path.exists());
        assert!(result.size_bytes > 0);
        assert_eq!(result.file_count, 2);
        assert!(result.warnings.is_empty());
        assert_eq!(result.metadata.categories, vec!["memory"]);

        let name = result.archive_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(ARCHIVE_PREFIX));
        assert!(name.ends_with(ARCHIVE_SUFFIX));
    }

    #[test]
    fn test_archive_members_and_synthetic_files() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let files = sample_files(source.path());

        let result = write_archive(output.path(), &files, "full").unwrap();
        let members = read_members(&result.archive_path);

        assert_eq!(members.len(), 4);
        assert_eq!(members["memory/goals.md"], b"# Goals\n");
        assert_eq!(members["memory/people/ada.md"], b"Ada Lovelace");

        let manifest = Manifest::from_json(&members[MANIFEST_FILENAME]).unwrap();
        assert_eq!(manifest, result.manifest);
        assert_eq!(
            manifest.get("memory/goals.md"),
            Some(&FileDigest::Sha256(
                sha256_file(&source.path().join("memory/goals.md")).unwrap()
            ))
        );

        let meta = RunMetadata::from_json(&members[META_FILENAME]).unwrap();
        assert_eq!(meta.label, "full");
        assert_eq!(meta.file_count, 2);
    }

    #[test]
    fn test_unaddable_file_is_dropped() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let mut files = sample_files(source.path());
        files.push(CollectedFile {
            source: source.path().join("memory/deleted.md"),
            archive_path: "memory/deleted.md".to_string(),
        });

        let result = write_archive(output.path(), &files, "memory").unwrap();

        assert_eq!(result.file_count, 2);
        assert!(result.manifest.get("memory/deleted.md").is_none());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Could not add memory/deleted.md")));

        let members = read_members(&result.archive_path);
        assert!(!members.contains_key("memory/deleted.md"));
    }

    #[test]
    fn test_empty_file_list_is_rejected() {
        let output = TempDir::new().unwrap();
        let err = write_archive(&output.path().join("never"), &[], "full").unwrap_err();

        assert!(matches!(err, BackupError::EmptyCollection));
        assert!(!output.path().join("never").exists());
    }

    #[test]
    fn test_archive_config_builder() {
        let config = ArchiveConfig::new("full")
            .with_compression_level(9)
            .with_progress(true);

        assert_eq!(config.label, "full");
        assert_eq!(config.compression_level, 9);
        assert!(config.show_progress);
    }

    #[test]
    fn test_archive_config_compression_clamping() {
        let config = ArchiveConfig::new("full").with_compression_level(15);
        assert_eq!(config.compression_level, 9);

        let config = ArchiveConfig::new("full").with_compression_level(0);
        assert_eq!(config.compression_level, 1);
    }
}
