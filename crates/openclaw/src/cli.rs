//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

// Re-export command types for convenience
pub use crate::commands::backup::BackupArgs;
pub use crate::commands::restore::RestoreArgs;
pub use crate::commands::verify::VerifyArgs;

/// OpenClaw - back up, verify, and restore memory, sessions, and config
#[derive(Parser, Debug)]
#[command(name = "openclaw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a backup settings file (default: ~/.openclaw/backup.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a backup archive
    Backup(BackupArgs),

    /// Check an archive against its embedded manifest
    Verify(VerifyArgs),

    /// Restore an archive into the live directories
    Restore(RestoreArgs),

    /// List backup categories
    Categories,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::backup::ModeArg;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backup_defaults() {
        let cli = Cli::try_parse_from(["openclaw", "backup"]).unwrap();
        let Commands::Backup(args) = cli.command else {
            panic!("expected backup");
        };
        assert_eq!(args.mode, ModeArg::Full);
        assert!(args.output.is_none());
        assert!(args.keep.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_backup_flags() {
        let cli = Cli::try_parse_from([
            "openclaw",
            "-vv",
            "--settings",
            "/tmp/b.yaml",
            "backup",
            "--mode",
            "selective",
            "--include",
            "people,knowledge",
            "--since",
            "2025-01-01",
            "--keep",
            "5",
            "--compression",
            "9",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings.as_deref().map(|p| p.as_str()), Some("/tmp/b.yaml"));
        let Commands::Backup(args) = cli.command else {
            panic!("expected backup");
        };
        assert_eq!(args.mode, ModeArg::Selective);
        assert_eq!(args.include.as_deref(), Some("people,knowledge"));
        assert_eq!(args.since.as_deref(), Some("2025-01-01"));
        assert_eq!(args.keep, Some(5));
        assert_eq!(args.compression, Some(9));
    }

    #[test]
    fn test_compression_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["openclaw", "backup", "--compression", "0"]).is_err());
        assert!(Cli::try_parse_from(["openclaw", "backup", "--compression", "10"]).is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["openclaw", "backup", "--mode", "everything"]).is_err());
    }

    #[test]
    fn test_verify_and_restore_require_archive() {
        assert!(Cli::try_parse_from(["openclaw", "verify"]).is_err());
        assert!(Cli::try_parse_from(["openclaw", "restore"]).is_err());

        let cli = Cli::try_parse_from([
            "openclaw",
            "restore",
            "backups/openclaw-backup-2025-01-01-000000.tar.gz",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Restore(args) = cli.command else {
            panic!("expected restore");
        };
        assert!(args.dry_run);
        assert_eq!(
            args.archive.as_str(),
            "backups/openclaw-backup-2025-01-01-000000.tar.gz"
        );
    }
}
