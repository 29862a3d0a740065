//! Restore of an archive into the live project, home configuration, and
//! sessions directories.
//!
//! A restore runs in two passes. The first ([`analyze`]) reads the whole
//! archive to validate it and build a per-category plan; nothing is written
//! if it fails. The second extracts each payload member to the location
//! chosen by [`resolve_target`], overwriting whatever is there.

use crate::checksum::CHUNK_SIZE;
use crate::error::{BackupError, Result};
use crate::manifest::is_synthetic_member;
use crate::progress::RestoreProgress;
use flate2::read::GzDecoder;
use openclaw_core::OpenClawPaths;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tar::{Archive, EntryType};
use tracing::{debug, info, warn};

pub mod analysis;
pub mod target;

pub use analysis::{analyze, RestorePlan};
pub use target::{resolve_target, RestoreTarget};

/// Outcome of a restore.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Files written (or that would be written, on a dry run)
    pub restored: usize,

    /// Members skipped because their target is unknown or unsafe
    pub skipped: usize,

    /// Members that could not be written
    pub failed: usize,

    /// Plan from the validation pass
    pub plan: RestorePlan,

    /// Per-member problems
    pub warnings: Vec<String>,

    /// Whether anything was actually written
    pub dry_run: bool,

    pub duration: Duration,
}

impl RestoreReport {
    fn new(plan: RestorePlan, dry_run: bool) -> Self {
        Self {
            restored: 0,
            skipped: 0,
            failed: 0,
            plan,
            warnings: Vec::new(),
            dry_run,
            duration: Duration::ZERO,
        }
    }

    fn skip(&mut self, message: String) {
        warn!("Skipping {}", message);
        self.skipped += 1;
        self.warnings.push(message);
    }

    fn fail(&mut self, message: String) {
        warn!("Could not restore {}", message);
        self.failed += 1;
        self.warnings.push(message);
    }
}

/// How copying one member ended.
enum CopyError {
    /// Reading the archive failed; the container is damaged
    Read(io::Error),

    /// Writing the destination failed
    Write(io::Error),
}

/// Restores archives into a set of roots.
#[derive(Debug, Clone, Default)]
pub struct Restorer {
    dry_run: bool,
    show_progress: bool,
}

impl Restorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report what would be restored.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Restores `archive_path` into the roots in `paths`.
    pub fn restore(&self, archive_path: &Path, paths: &OpenClawPaths) -> Result<RestoreReport> {
        let start = Instant::now();

        info!("Validating {}", archive_path.display());
        let plan = analyze(archive_path)?;

        info!(
            "{} {} file(s) from {}",
            if self.dry_run { "Would restore" } else { "Restoring" },
            plan.files,
            archive_path.display()
        );

        let mut progress = self.show_progress.then(RestoreProgress::new);
        if let Some(ref mut progress) = progress {
            progress.start_extract(plan.files as u64, "Restoring files...");
        }

        let mut report = RestoreReport::new(plan, self.dry_run);

        let file = File::open(archive_path)?;
        let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
        let corrupt = |e: io::Error| BackupError::corruption(archive_path, e);

        for entry in archive.entries().map_err(corrupt)? {
            let mut entry = entry.map_err(corrupt)?;
            let name = entry.path().map_err(corrupt)?.to_string_lossy().to_string();

            match entry.header().entry_type() {
                EntryType::Regular => {}
                EntryType::Directory => continue,
                other => {
                    report.skip(format!("{}: unsupported member type {:?}", name, other));
                    continue;
                }
            }
            if is_synthetic_member(&name) {
                continue;
            }

            if let Some(ref progress) = progress {
                progress.inc_extract();
            }

            let dest = match resolve_target(&name, paths) {
                RestoreTarget::Write(dest) => dest,
                RestoreTarget::Unresolved(reason) | RestoreTarget::Unsafe(reason) => {
                    report.skip(reason);
                    continue;
                }
            };

            if self.dry_run {
                debug!("Would restore {} -> {}", name, dest.display());
                report.restored += 1;
                continue;
            }

            let mtime = entry.header().mtime().ok();
            match extract_member(&mut entry, &dest, mtime) {
                Ok(()) => {
                    debug!("Restored {} -> {}", name, dest.display());
                    report.restored += 1;
                }
                Err(CopyError::Write(e)) => report.fail(format!("{}: {}", name, e)),
                Err(CopyError::Read(e)) => return Err(corrupt(e)),
            }
        }

        if let Some(ref progress) = progress {
            progress.finish_all();
        }

        report.duration = start.elapsed();
        info!(
            "Restore finished: {} restored, {} skipped, {} failed",
            report.restored, report.skipped, report.failed
        );

        Ok(report)
    }
}

/// Restores `archive_path` into the roots in `paths`.
pub fn restore(archive_path: &Path, paths: &OpenClawPaths) -> Result<RestoreReport> {
    Restorer::new().restore(archive_path, paths)
}

/// Streams one member to `dest`, creating parent directories and replacing
/// any existing file.
fn extract_member<R: Read>(
    entry: &mut R,
    dest: &Path,
    mtime: Option<u64>,
) -> std::result::Result<(), CopyError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(CopyError::Write)?;
    }

    let file = File::create(dest).map_err(CopyError::Write)?;
    let mut writer = BufWriter::new(file);
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| CopyError::Write(e.into_error()))?;

    if let Some(secs) = mtime {
        let modified: SystemTime = UNIX_EPOCH + Duration::from_secs(secs);
        if let Err(e) = file.set_modified(modified) {
            debug!("Could not set mtime on {}: {}", dest.display(), e);
        }
    }

    Ok(())
}
