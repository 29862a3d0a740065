//! Verify command

use anyhow::{bail, Result};
use camino::Utf8PathBuf;
use clap::Args;
use openclaw_backup::verify;

use crate::output;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Archive to verify
    pub archive: Utf8PathBuf,
}

pub fn run(args: VerifyArgs) -> Result<()> {
    output::header("Verify Backup");
    output::kv("Archive", args.archive.as_str());
    println!();

    let spinner = output::spinner("Checking archive...");
    let result = verify(args.archive.as_std_path());
    spinner.finish_and_clear();
    let report = result?;

    output::kv("Members", &report.members.to_string());

    if !report.manifest_present {
        output::warning("No MANIFEST.json in archive: contents are readable but unverified");
        return Ok(());
    }

    for path in &report.mismatched {
        output::error(&format!("MISMATCH: {}", path));
    }
    for path in &report.missing {
        output::error(&format!("MISSING: {}", path));
    }
    if report.unverifiable > 0 {
        output::warning(&format!(
            "{} file(s) were unreadable at backup time and could not be checked",
            report.unverifiable
        ));
    }

    output::kv("OK", &report.ok.to_string());
    output::kv("Errors", &report.error_count().to_string());
    println!();

    if !report.is_success() {
        bail!(
            "Verification failed: {} error(s) in {}",
            report.error_count(),
            args.archive
        );
    }

    output::success(&format!("All {} file(s) verified", report.ok));
    Ok(())
}
