//! Integrity manifest and run metadata.
//!
//! Both are stored as synthetic members at the end of every archive:
//! - `MANIFEST.json`: archive path → SHA256 hex digest, or `"ERROR"` when the
//!   file could not be read while hashing
//! - `BACKUP_META.json`: creation time, label, file count, and top-level prefixes

use crate::checksum::sha256_file;
use crate::collector::{archive_prefix, CollectedFile};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Name of the manifest member in the archive.
pub const MANIFEST_FILENAME: &str = "MANIFEST.json";

/// Name of the run metadata member in the archive.
pub const META_FILENAME: &str = "BACKUP_META.json";

/// Manifest value recorded for files that could not be hashed.
pub const ERROR_SENTINEL: &str = "ERROR";

/// True for the two synthetic members every archive carries.
pub fn is_synthetic_member(name: &str) -> bool {
    name == MANIFEST_FILENAME || name == META_FILENAME
}

/// Digest recorded for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileDigest {
    /// Lowercase hex SHA256
    Sha256(String),

    /// The file was unreadable when hashed
    Unreadable,
}

impl FileDigest {
    pub fn as_str(&self) -> &str {
        match self {
            FileDigest::Sha256(hex) => hex,
            FileDigest::Unreadable => ERROR_SENTINEL,
        }
    }
}

impl From<String> for FileDigest {
    fn from(value: String) -> Self {
        if value == ERROR_SENTINEL {
            FileDigest::Unreadable
        } else {
            FileDigest::Sha256(value)
        }
    }
}

impl From<FileDigest> for String {
    fn from(digest: FileDigest) -> Self {
        match digest {
            FileDigest::Sha256(hex) => hex,
            FileDigest::Unreadable => ERROR_SENTINEL.to_string(),
        }
    }
}

/// Mapping from archive path to digest, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, FileDigest>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes every collected file. Unreadable files are recorded as
    /// [`FileDigest::Unreadable`]; they never abort the build.
    pub fn build(files: &[CollectedFile]) -> Self {
        Self::build_with(files, || {})
    }

    /// Like [`Manifest::build`], calling `on_hashed` after each file.
    pub fn build_with(files: &[CollectedFile], mut on_hashed: impl FnMut()) -> Self {
        let mut manifest = Manifest::new();
        for file in files {
            let digest = match sha256_file(&file.source) {
                Ok(hex) => FileDigest::Sha256(hex),
                Err(e) => {
                    warn!("Could not hash {}: {}", file.archive_path, e);
                    FileDigest::Unreadable
                }
            };
            manifest.insert(file.archive_path.clone(), digest);
            on_hashed();
        }
        manifest
    }

    pub fn insert(&mut self, archive_path: String, digest: FileDigest) {
        self.entries.insert(archive_path, digest);
    }

    pub fn remove(&mut self, archive_path: &str) -> Option<FileDigest> {
        self.entries.remove(archive_path)
    }

    pub fn get(&self, archive_path: &str) -> Option<&FileDigest> {
        self.entries.get(archive_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileDigest)> {
        self.entries.iter()
    }

    /// Archive paths recorded as unreadable.
    pub fn unreadable(&self) -> impl Iterator<Item = &String> {
        self.entries
            .iter()
            .filter(|(_, digest)| **digest == FileDigest::Unreadable)
            .map(|(path, _)| path)
    }

    /// Serializes as a pretty-printed JSON object with sorted keys.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }
}

/// Hashes every collected file into a new [`Manifest`].
pub fn build_manifest(files: &[CollectedFile]) -> Manifest {
    Manifest::build(files)
}

/// Run metadata stored as `BACKUP_META.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Local creation time, ISO-8601
    pub created: String,

    /// Run label (mode name, or `selective (...)`)
    pub label: String,

    /// Number of payload files in the archive
    pub file_count: usize,

    /// Top-level prefixes present in the archive, sorted
    pub categories: Vec<String>,
}

impl RunMetadata {
    /// Builds metadata for the given archive paths, stamped with the current time.
    pub fn new<'a>(label: &str, archive_paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut file_count = 0;
        let mut prefixes = BTreeSet::new();
        for path in archive_paths {
            file_count += 1;
            prefixes.insert(archive_prefix(path).to_string());
        }

        Self {
            created: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            label: label.to_string(),
            file_count,
            categories: prefixes.into_iter().collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }
}
