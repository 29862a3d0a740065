//! Archive integrity verification against the embedded manifest.

use crate::checksum::sha256_reader;
use crate::error::{BackupError, Result};
use crate::manifest::{FileDigest, Manifest, MANIFEST_FILENAME};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::{debug, info, warn};

/// Outcome of verifying one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Regular-file members in the archive, synthetic ones included
    pub members: usize,

    /// False when the archive carries no `MANIFEST.json`
    pub manifest_present: bool,

    /// Entries whose digest matched
    pub ok: usize,

    /// Entries whose digest differs from the member content
    pub mismatched: Vec<String>,

    /// Entries with no member in the archive
    pub missing: Vec<String>,

    /// Entries recorded as unreadable at backup time and not checked
    pub unverifiable: usize,
}

impl VerificationReport {
    /// True when no entry mismatched or went missing.
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.mismatched.len() + self.missing.len()
    }
}

/// What a single pass over the archive yields.
struct ArchiveScan {
    members: usize,
    digests: HashMap<String, String>,
    manifest: Option<Vec<u8>>,
}

/// Reads every member once, hashing payloads and capturing the manifest.
///
/// Any error from the gzip or tar layer is corruption. A member name that
/// repeats replaces the earlier digest.
fn scan(archive_path: &Path) -> Result<ArchiveScan> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    let corrupt = |e: std::io::Error| BackupError::corruption(archive_path, e);

    let mut scan = ArchiveScan {
        members: 0,
        digests: HashMap::new(),
        manifest: None,
    };

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        if entry.header().entry_type() != EntryType::Regular {
            continue;
        }

        let name = entry.path().map_err(corrupt)?.to_string_lossy().to_string();
        scan.members += 1;

        if name == MANIFEST_FILENAME {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(corrupt)?;
            scan.manifest = Some(data);
        } else {
            let digest = sha256_reader(&mut entry).map_err(corrupt)?;
            debug!("Hashed member {}", name);
            scan.digests.insert(name, digest);
        }
    }

    Ok(scan)
}

/// Verifies `archive_path` against its `MANIFEST.json`.
///
/// Returns an error only when the archive is missing or unreadable; per-file
/// problems are reported in the [`VerificationReport`].
pub fn verify(archive_path: &Path) -> Result<VerificationReport> {
    if !archive_path.is_file() {
        return Err(BackupError::archive_not_found(archive_path));
    }

    info!("Verifying {}", archive_path.display());
    let scan = scan(archive_path)?;

    let mut report = VerificationReport {
        members: scan.members,
        ..Default::default()
    };

    let Some(manifest_bytes) = scan.manifest else {
        warn!("No {} in archive; contents are readable but unverified", MANIFEST_FILENAME);
        return Ok(report);
    };
    report.manifest_present = true;

    let manifest = Manifest::from_json(&manifest_bytes)
        .map_err(|e| BackupError::corruption(archive_path, format!("malformed manifest: {}", e)))?;

    for (path, expected) in manifest.iter() {
        let FileDigest::Sha256(expected) = expected else {
            report.unverifiable += 1;
            continue;
        };

        match scan.digests.get(path) {
            Some(actual) if actual == expected => report.ok += 1,
            Some(_) => {
                warn!("MISMATCH: {}", path);
                report.mismatched.push(path.clone());
            }
            None => {
                warn!("MISSING: {}", path);
                report.missing.push(path.clone());
            }
        }
    }

    info!(
        "Verified {} entries: {} ok, {} error(s)",
        report.ok + report.error_count(),
        report.ok,
        report.error_count()
    );

    Ok(report)
}
