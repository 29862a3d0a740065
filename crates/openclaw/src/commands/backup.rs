//! Backup command

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use openclaw_backup::{
    collect, resolve_categories, rotate, run_label, ArchiveBuilder, ArchiveConfig, BackupError,
    BackupMode, Category, Collection, SinceCutoff, DEFAULT_COMPRESSION_LEVEL,
};
use openclaw_core::BackupSettings;
use std::path::{Path, PathBuf};

use crate::commands::{load_settings, pick_path, resolve_paths};
use crate::output;

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Backup mode
    #[arg(short, long, default_value = "full", value_enum)]
    pub mode: ModeArg,

    /// Directory for backup archives (default: current directory)
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,

    /// Comma-separated categories for selective mode (e.g. people,knowledge)
    #[arg(long)]
    pub include: Option<String>,

    /// Only include session logs modified on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub since: Option<String>,

    /// Keep only the N most recent backups (0 or less keeps all)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub keep: Option<i64>,

    /// Override the OpenClaw project root directory
    #[arg(long)]
    pub base_dir: Option<Utf8PathBuf>,

    /// Override the agent sessions directory
    #[arg(long)]
    pub sessions_dir: Option<Utf8PathBuf>,

    /// Compression level (1-9)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=9))]
    pub compression: Option<u32>,

    /// Dry-run mode (show what would be backed up)
    #[arg(long)]
    pub dry_run: bool,

    /// Show all files being backed up
    #[arg(long)]
    pub show_files: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Every category: vault, config, and sessions
    Full,

    /// Memory vault only
    Memory,

    /// Session logs only
    Sessions,

    /// Only the categories given with --include
    Selective,
}

impl From<ModeArg> for BackupMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => BackupMode::Full,
            ModeArg::Memory => BackupMode::Memory,
            ModeArg::Sessions => BackupMode::Sessions,
            ModeArg::Selective => BackupMode::Selective,
        }
    }
}

/// Options after layering flags over settings and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedOptions {
    output_dir: PathBuf,
    keep: usize,
    compression_level: u32,
}

fn resolve_options(args: &BackupArgs, settings: &BackupSettings) -> Result<ResolvedOptions> {
    let output_dir = pick_path(args.output.as_deref(), settings.output_dir.as_deref())?
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(ResolvedOptions {
        output_dir,
        keep: args
            .keep
            .or(settings.keep)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0),
        compression_level: args
            .compression
            .or(settings.compression_level)
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL),
    })
}

pub fn run(args: BackupArgs, settings_file: Option<&Utf8Path>) -> Result<()> {
    let mode = BackupMode::from(args.mode);

    // Validate everything before touching the filesystem.
    let (categories, since) = match validate_selection(mode, &args) {
        Ok(selection) => selection,
        Err(e) => {
            if let Some(hint) = usage_hint(&e) {
                output::info(hint);
            }
            return Err(e.into());
        }
    };
    let settings = load_settings(settings_file)?;
    let options = resolve_options(&args, &settings)?;
    let paths = resolve_paths(
        &settings,
        args.base_dir.as_deref(),
        args.sessions_dir.as_deref(),
    )?;
    let label = run_label(mode, &categories);

    output::header("OpenClaw Backup");
    output::kv("Mode", &label);
    output::kv("Base", &paths.base_dir.display().to_string());
    output::kv(
        "Sessions",
        &paths
            .sessions_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string()),
    );
    output::kv("Output", &options.output_dir.display().to_string());
    if let Some(cutoff) = since {
        output::kv("Since", &cutoff.as_datetime().format("%Y-%m-%d").to_string());
    }
    if args.dry_run {
        output::warning("DRY RUN MODE - No backup will be created");
    }
    println!();

    let spinner = output::spinner("Collecting files...");
    let collection = collect(&paths, &categories, since);
    spinner.finish_and_clear();

    if collection.is_empty() {
        return Err(BackupError::EmptyCollection.into());
    }

    print_collection(&collection, args.show_files);

    if args.dry_run {
        output::success("Dry run complete");
        return Ok(());
    }

    let archive_config = ArchiveConfig::new(&label)
        .with_compression_level(options.compression_level)
        .with_progress(!args.show_files);

    let result = ArchiveBuilder::new(archive_config)
        .create(&options.output_dir, collection.files())
        .with_context(|| format!("Failed to create backup in {}", options.output_dir.display()))?;

    for warning in &result.warnings {
        output::warning(warning);
    }

    println!();
    output::success("Backup created successfully");
    println!();
    output::kv("Location", &result.archive_path.display().to_string());
    output::kv("Files", &result.file_count.to_string());
    output::kv("Size", &output::format_bytes(result.size_bytes));
    output::kv("Duration", &format!("{:.1}s", result.duration_seconds));

    if options.keep > 0 {
        report_rotation(&options.output_dir, options.keep);
    }

    println!();
    output::info("Verify with:");
    println!("  openclaw verify {}", result.archive_path.display());

    Ok(())
}

fn validate_selection(
    mode: BackupMode,
    args: &BackupArgs,
) -> openclaw_backup::Result<(Vec<Category>, Option<SinceCutoff>)> {
    let categories = resolve_categories(mode, args.include.as_deref())?;
    let since = args.since.as_deref().map(SinceCutoff::parse).transpose()?;
    Ok((categories, since))
}

/// Follow-up advice for input errors.
fn usage_hint(err: &BackupError) -> Option<&'static str> {
    err.is_configuration()
        .then_some("Run 'openclaw categories' to list categories, or 'openclaw backup --help' for options")
}

fn print_collection(collection: &Collection, show_files: bool) {
    output::info(&format!("Found {} file(s):", collection.len()));
    for (prefix, count) in collection.prefix_counts() {
        println!("  {:<12} {}", prefix, console::style(count).cyan());
    }

    if show_files {
        println!();
        for file in collection.files() {
            println!("  {}", console::style(&file.archive_path).dim());
        }
    }
    println!();
}

fn report_rotation(output_dir: &Path, keep: usize) {
    let report = rotate(output_dir, keep);
    if !report.removed.is_empty() {
        output::info(&format!(
            "Rotated out {} old backup(s), keeping {}",
            report.removed.len(),
            report.kept.len()
        ));
    }
    for (path, reason) in &report.failed {
        output::warning(&format!("Could not remove {}: {}", path.display(), reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: BackupArgs,
    }

    fn args(argv: &[&str]) -> BackupArgs {
        let mut full = vec!["backup"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn test_defaults_without_settings() {
        let options = resolve_options(&args(&[]), &BackupSettings::default()).unwrap();
        assert_eq!(
            options,
            ResolvedOptions {
                output_dir: PathBuf::from("."),
                keep: 0,
                compression_level: DEFAULT_COMPRESSION_LEVEL,
            }
        );
    }

    #[test]
    fn test_settings_fill_unset_flags() {
        let settings = BackupSettings {
            output_dir: Some(PathBuf::from("/srv/backups")),
            keep: Some(7),
            compression_level: Some(3),
            ..Default::default()
        };

        let options = resolve_options(&args(&["--keep", "2"]), &settings).unwrap();
        assert_eq!(options.output_dir, PathBuf::from("/srv/backups"));
        assert_eq!(options.keep, 2);
        assert_eq!(options.compression_level, 3);
    }

    #[test]
    fn test_negative_keep_disables_rotation() {
        let options = resolve_options(&args(&["--keep", "-1"]), &BackupSettings::default()).unwrap();
        assert_eq!(options.keep, 0);

        let settings = BackupSettings {
            keep: Some(-5),
            ..Default::default()
        };
        let options = resolve_options(&args(&[]), &settings).unwrap();
        assert_eq!(options.keep, 0);
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(BackupMode::from(ModeArg::Selective), BackupMode::Selective);
        assert_eq!(BackupMode::from(ModeArg::Memory), BackupMode::Memory);
    }

    #[test]
    fn test_invalid_selection_fails_before_writing() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = Utf8PathBuf::from_path_buf(temp.path().join("out")).unwrap();
        let backup = args(&[
            "--mode",
            "selective",
            "--include",
            "photos",
            "--output",
            output.as_str(),
        ]);

        let err = run(backup, None).unwrap_err();
        assert!(err.to_string().contains("Unknown categories: photos"));
        assert!(!output.exists());
    }

    #[test]
    fn test_usage_hint_only_for_input_errors() {
        let err = validate_selection(
            BackupMode::Selective,
            &args(&["--mode", "selective", "--include", "photos"]),
        )
        .unwrap_err();
        assert!(usage_hint(&err).is_some_and(|hint| hint.contains("openclaw categories")));

        let err = validate_selection(BackupMode::Full, &args(&["--since", "2025-13-01"])).unwrap_err();
        assert!(usage_hint(&err).is_some());

        assert!(usage_hint(&BackupError::EmptyCollection).is_none());
    }

    #[test]
    fn test_malformed_since_rejected() {
        let err = run(args(&["--since", "01/02/2025"]), None).unwrap_err();
        assert!(err.to_string().contains("Invalid date format"));
    }
}
