//! OpenClaw CLI - backup, verification, and restore
//!
//! This is the main entry point for the `openclaw` command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let settings = cli.settings.as_deref();
    match cli.command {
        Commands::Backup(args) => commands::backup::run(args, settings),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Restore(args) => commands::restore::run(args, settings),
        Commands::Categories => commands::categories::run(),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout stays clean for results.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
