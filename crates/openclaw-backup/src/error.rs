//! Error types for backup, verify, and restore.
//!
//! Per-file I/O problems are not errors here: they are reported as warnings
//! on the operation's result and never abort a run.

use crate::category::Category;
use std::path::Path;
use thiserror::Error;

/// Result type alias using [`BackupError`]
pub type Result<T> = std::result::Result<T, BackupError>;

/// Fatal failures of a backup, verify, or restore run
#[derive(Error, Debug)]
pub enum BackupError {
    /// One or more requested categories are not in the registry
    #[error("Unknown categories: {}. Available: {}", unknown.join(", "), Category::available())]
    UnknownCategories { unknown: Vec<String> },

    /// Selective mode was requested without an include list
    #[error("An include list is required for selective mode. Available: {}", Category::available())]
    MissingInclude,

    /// The since filter is not a YYYY-MM-DD date
    #[error("Invalid date format '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// Nothing matched the requested categories
    #[error("No files found to back up")]
    EmptyCollection,

    /// The archive path does not point at a file
    #[error("Archive not found: {path}")]
    ArchiveNotFound { path: String },

    /// The archive is not a readable gzip-compressed tar stream
    #[error("Archive is corrupt: {path}: {message}")]
    ArchiveCorruption { path: String, message: String },

    /// IO error outside per-file handling (output directory, archive file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error for synthetic members
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackupError {
    /// Create an invalid date error
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    /// Create an archive not found error
    pub fn archive_not_found(path: &Path) -> Self {
        Self::ArchiveNotFound {
            path: path.display().to_string(),
        }
    }

    /// Create an archive corruption error
    pub fn corruption(path: &Path, message: impl ToString) -> Self {
        Self::ArchiveCorruption {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// True for input-validation failures raised before any filesystem write.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownCategories { .. }
                | Self::MissingInclude
                | Self::InvalidDate { .. }
        )
    }
}
