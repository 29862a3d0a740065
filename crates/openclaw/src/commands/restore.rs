//! Restore command
//!
//! Connects the CLI restore UI to the openclaw-backup restore library.

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use openclaw_backup::{RestoreReport, Restorer};

use crate::commands::{load_settings, resolve_paths};
use crate::output;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Archive to restore
    pub archive: Utf8PathBuf,

    /// Override the OpenClaw project root directory
    #[arg(long)]
    pub base_dir: Option<Utf8PathBuf>,

    /// Override the agent sessions directory
    #[arg(long)]
    pub sessions_dir: Option<Utf8PathBuf>,

    /// Dry-run mode (show what would be restored)
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: RestoreArgs, settings_file: Option<&Utf8Path>) -> Result<()> {
    let settings = load_settings(settings_file)?;
    let paths = resolve_paths(
        &settings,
        args.base_dir.as_deref(),
        args.sessions_dir.as_deref(),
    )?;

    output::header("Restore Backup");
    output::kv("Archive", args.archive.as_str());
    output::kv("Base", &paths.base_dir.display().to_string());
    output::kv("Config", &paths.openclaw_dir.display().to_string());
    output::kv(
        "Sessions",
        &paths
            .sessions_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string()),
    );
    if args.dry_run {
        output::warning("DRY RUN MODE - No files will be written");
    } else {
        output::warning("Existing files will be overwritten");
    }
    println!();

    let report = Restorer::new()
        .with_dry_run(args.dry_run)
        .with_progress(true)
        .restore(args.archive.as_std_path(), &paths)?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RestoreReport) {
    if let Some(meta) = &report.plan.metadata {
        output::kv("Created", &meta.created);
        output::kv("Label", &meta.label);
    }
    if !report.plan.manifest_present {
        output::warning("Archive has no manifest; its contents cannot be verified");
    }

    output::info("Contents:");
    for (category, count) in &report.plan.categories {
        println!("  {:<12} {}", category, console::style(count).cyan());
    }
    println!();

    for warning in &report.warnings {
        output::warning(warning);
    }

    let verb = if report.dry_run { "Would restore" } else { "Restored" };
    output::success(&format!("{} {} file(s)", verb, report.restored));
    if report.skipped > 0 {
        output::kv("Skipped", &report.skipped.to_string());
    }
    if report.failed > 0 {
        output::kv("Failed", &report.failed.to_string());
    }
    output::kv("Duration", &format!("{:.1}s", report.duration.as_secs_f64()));
}
