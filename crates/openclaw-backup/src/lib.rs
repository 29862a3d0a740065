//! OpenClaw Backup System
//!
//! Backup, verification, and restore of an OpenClaw installation: the
//! Markdown memory vault in the project directory, agent session logs, and
//! configuration files.
//!
//! # Features
//!
//! - **Category registry**: vault, config, and session categories combined by
//!   run mode (full, memory, sessions, selective)
//! - **Deduplicated collection**: every archive path appears once, first claim wins
//! - **Integrity manifest**: streaming SHA256 of every file, embedded as `MANIFEST.json`
//! - **Retention**: keep the N most recent archives
//! - **Verification**: single-pass check of every member against the manifest
//! - **Restore**: validated first pass, then prefix-routed extraction
//!
//! # Examples
//!
//! ```no_run
//! use openclaw_backup::{
//!     collect, resolve_categories, rotate, run_label, verify, ArchiveBuilder, ArchiveConfig,
//!     BackupMode,
//! };
//! use openclaw_core::OpenClawPaths;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let paths = OpenClawPaths::discover(None, None)?;
//!     let categories = resolve_categories(BackupMode::Full, None)?;
//!     let files = collect(&paths, &categories, None);
//!
//!     let output = Path::new("/var/backups/openclaw");
//!     let config = ArchiveConfig::new(run_label(BackupMode::Full, &categories));
//!     let result = ArchiveBuilder::new(config).create(output, files.files())?;
//!     rotate(output, 7);
//!
//!     let report = verify(&result.archive_path)?;
//!     println!("{} ok, {} errors", report.ok, report.error_count());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod category;
pub mod checksum;
pub mod collector;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod restore;
pub mod retention;
pub mod verify;

// Re-export commonly used types
pub use archive::{
    archive_filename, write_archive, ArchiveBuilder, ArchiveConfig, BackupResult,
    DEFAULT_COMPRESSION_LEVEL,
};
pub use category::{resolve_categories, run_label, BackupMode, Category, CollectionRule, Priority};
pub use checksum::{sha256_bytes, sha256_file};
pub use collector::{collect, CollectedFile, Collection, SinceCutoff};
pub use error::{BackupError, Result};
pub use manifest::{
    build_manifest, FileDigest, Manifest, RunMetadata, MANIFEST_FILENAME, META_FILENAME,
};
pub use progress::{BackupProgress, RestoreProgress};
pub use restore::{restore, RestorePlan, RestoreReport, Restorer};
pub use retention::{list_archives, rotate, RotationReport};
pub use verify::{verify, VerificationReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_member_constants() {
        assert_eq!(MANIFEST_FILENAME, "MANIFEST.json");
        assert_eq!(META_FILENAME, "BACKUP_META.json");
    }
}
