//! First pass over an archive before anything is written.

use crate::collector::archive_prefix;
use crate::error::{BackupError, Result};
use crate::manifest::{is_synthetic_member, RunMetadata, MANIFEST_FILENAME, META_FILENAME};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::{info, warn};

/// What a restore of an archive would touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorePlan {
    /// Top-level prefix → number of payload files
    pub categories: BTreeMap<String, usize>,

    /// Payload files in the archive (synthetic members excluded)
    pub files: usize,

    /// Whether the archive carries a manifest
    pub manifest_present: bool,

    /// Run metadata, when present and well-formed
    pub metadata: Option<RunMetadata>,
}

/// Reads the whole archive once, validating the container and counting
/// payload files per category.
///
/// Every member is read to the end so a damaged gzip stream is detected here
/// rather than halfway through extraction.
pub fn analyze(archive_path: &Path) -> Result<RestorePlan> {
    if !archive_path.is_file() {
        return Err(BackupError::archive_not_found(archive_path));
    }

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    let corrupt = |e: io::Error| BackupError::corruption(archive_path, e);

    let mut plan = RestorePlan::default();

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        if entry.header().entry_type() != EntryType::Regular {
            io::copy(&mut entry, &mut io::sink()).map_err(corrupt)?;
            continue;
        }
        let name = entry.path().map_err(corrupt)?.to_string_lossy().to_string();

        if name == META_FILENAME {
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(corrupt)?;
            match RunMetadata::from_json(&data) {
                Ok(meta) => plan.metadata = Some(meta),
                Err(e) => warn!("Ignoring unreadable {}: {}", META_FILENAME, e),
            }
            continue;
        }

        io::copy(&mut entry, &mut io::sink()).map_err(corrupt)?;

        if name == MANIFEST_FILENAME {
            plan.manifest_present = true;
        } else if !is_synthetic_member(&name) {
            plan.files += 1;
            *plan
                .categories
                .entry(archive_prefix(&name).to_string())
                .or_insert(0) += 1;
        }
    }

    info!(
        "Archive holds {} file(s) in {} top-level categories",
        plan.files,
        plan.categories.len()
    );

    Ok(plan)
}
