//! Shared fixtures for openclaw-backup integration tests.

#![allow(dead_code)]

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use openclaw_backup::{
    collect, resolve_categories, run_label, ArchiveBuilder, ArchiveConfig, BackupMode,
    BackupResult,
};
use openclaw_core::OpenClawPaths;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch installation: project base, home config dir, sessions dir, and
/// an output directory for archives.
pub struct Installation {
    temp: TempDir,
    pub paths: OpenClawPaths,
    pub output: PathBuf,
}

impl Installation {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let base = temp.path().join("project");
        let openclaw = temp.path().join("home/.openclaw");
        let sessions = openclaw.join("agents/main/sessions");
        fs::create_dir_all(&base).expect("base dir");
        fs::create_dir_all(&sessions).expect("sessions dir");

        Self {
            paths: OpenClawPaths::new(base, openclaw, Some(sessions)),
            output: temp.path().join("backups"),
            temp,
        }
    }

    /// Same roots, but nothing on disk; used as a restore destination.
    pub fn empty_like() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let openclaw = temp.path().join("home/.openclaw");
        Self {
            paths: OpenClawPaths::new(
                temp.path().join("project"),
                openclaw.clone(),
                Some(openclaw.join("agents/main/sessions")),
            ),
            output: temp.path().join("backups"),
            temp,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn write_base(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.paths.base_dir.join(relative), content)
    }

    pub fn write_home(&self, relative: &str, content: &str) -> PathBuf {
        write(&self.paths.openclaw_dir.join(relative), content)
    }

    pub fn write_session(&self, relative: &str, content: &str) -> PathBuf {
        let dir = self.paths.sessions_dir.as_ref().expect("sessions dir");
        write(&dir.join(relative), content)
    }

    /// Populates a small vault, config, and two session logs.
    pub fn populate(&self) {
        self.write_base("memory/2025-01-01.md", "Daily note\n");
        self.write_base("memory/goals.md", "# Goals\n- ship\n");
        self.write_base("memory/people/ada.md", "Ada Lovelace\n");
        self.write_base("memory/knowledge/rust.md", "Ownership\n");
        self.write_base("memory/decisions/2025-01-01-note.md", "hello");
        self.write_base("memory/playbooks/deploy.md", "1. build\n");
        self.write_base("memory/threads/open.md", "pending\n");
        self.write_base("openclaw.mjs", "export default {};\n");
        self.write_home("config.json", "{\"theme\":\"dark\"}");
        self.write_session("a.jsonl", "{\"role\":\"user\"}\n");
        self.write_session("archive/b.jsonl", "{\"role\":\"assistant\"}\n");
    }

    /// Runs a backup in `mode` into the output directory.
    pub fn backup(&self, mode: BackupMode, include: Option<&str>) -> BackupResult {
        let categories = resolve_categories(mode, include).expect("categories");
        let files = collect(&self.paths, &categories, None);
        ArchiveBuilder::new(ArchiveConfig::new(run_label(mode, &categories)))
            .create(&self.output, files.files())
            .expect("backup")
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// Rewrites `archive` with the first occurrence of `needle` in the
/// decompressed tar stream altered by one byte.
pub fn flip_byte_in_payload(archive: &Path, needle: &[u8]) {
    let mut tar_bytes = Vec::new();
    GzDecoder::new(fs::File::open(archive).expect("open"))
        .read_to_end(&mut tar_bytes)
        .expect("gunzip");

    let offset = tar_bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("payload present in archive");
    tar_bytes[offset] ^= 0x01;

    let mut encoder = GzEncoder::new(fs::File::create(archive).expect("create"), Compression::default());
    encoder.write_all(&tar_bytes).expect("gzip");
    encoder.finish().expect("finish");
}
