//! Progress reporting for backup and restore operations.
//!
//! Provides visual feedback while hashing, packing, and extracting files.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;

const BAR_CHARS: &str = "#>-";

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(BAR_CHARS)
}

/// Progress reporter for backup operations.
#[derive(Debug, Clone)]
pub struct BackupProgress {
    multi: Arc<MultiProgress>,
    hash_bar: Option<ProgressBar>,
    archive_bar: Option<ProgressBar>,
}

impl BackupProgress {
    /// Creates a new backup progress reporter.
    pub fn new() -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            hash_bar: None,
            archive_bar: None,
        }
    }

    /// Starts the hashing phase with a known file count.
    pub fn start_hash(&mut self, total_files: u64, message: &str) {
        let bar = self.multi.add(ProgressBar::new(total_files));
        bar.set_style(bar_style("{msg} [{bar:40.yellow/blue}] {pos}/{len} files"));
        bar.set_message(message.to_string());
        self.hash_bar = Some(bar);
    }

    /// Increments the hashing progress by one file.
    pub fn inc_hash(&self) {
        if let Some(bar) = &self.hash_bar {
            bar.inc(1);
        }
    }

    /// Marks the hashing phase complete.
    pub fn finish_hash(&self, message: &str) {
        if let Some(bar) = &self.hash_bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Starts the archive creation phase with a known file count.
    pub fn start_archive(&mut self, total_files: u64, message: &str) {
        let bar = self.multi.add(ProgressBar::new(total_files));
        bar.set_style(bar_style(
            "{msg} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)",
        ));
        bar.set_message(message.to_string());
        self.archive_bar = Some(bar);
    }

    /// Increments the archive progress by one file.
    pub fn inc_archive(&self) {
        if let Some(bar) = &self.archive_bar {
            bar.inc(1);
        }
    }

    /// Finishes the archive phase.
    pub fn finish_archive(&self, message: &str) {
        if let Some(bar) = &self.archive_bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Finishes and clears all progress bars.
    pub fn finish_all(&self) {
        if let Some(bar) = &self.hash_bar {
            bar.finish_and_clear();
        }
        if let Some(bar) = &self.archive_bar {
            bar.finish_and_clear();
        }
    }
}

impl Default for BackupProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress reporter for restore operations.
#[derive(Debug, Clone)]
pub struct RestoreProgress {
    multi: Arc<MultiProgress>,
    extract_bar: Option<ProgressBar>,
}

impl RestoreProgress {
    /// Creates a new restore progress reporter.
    pub fn new() -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            extract_bar: None,
        }
    }

    /// Starts the extraction phase with a known member count.
    pub fn start_extract(&mut self, total_files: u64, message: &str) {
        let bar = self.multi.add(ProgressBar::new(total_files));
        bar.set_style(bar_style(
            "{msg} [{bar:40.green/blue}] {pos}/{len} files ({percent}%)",
        ));
        bar.set_message(message.to_string());
        self.extract_bar = Some(bar);
    }

    /// Increments the extraction progress by one member.
    pub fn inc_extract(&self) {
        if let Some(bar) = &self.extract_bar {
            bar.inc(1);
        }
    }

    /// Finishes and clears the extraction bar.
    pub fn finish_all(&self) {
        if let Some(bar) = &self.extract_bar {
            bar.finish_and_clear();
        }
    }
}

impl Default for RestoreProgress {
    fn default() -> Self {
        Self::new()
    }
}
