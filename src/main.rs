//! hostprov - student web hosting provisioner
//!
//! Creates SFTP-only Linux accounts with a public web directory and a private
//! MySQL database per student, and keeps the sshd SFTP restriction in place.

use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

mod accounts;
mod batch;
mod cli;
mod commands;
mod config;
mod database;
mod error;
mod identity;
mod lock;
mod operations;
mod pipeline;
mod preflight;
mod reconcile;
mod report;
mod secret;
mod ui;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "hostprov=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Provision(args) => commands::provision::run(cli.config, args),
        Commands::ConfigureSftp(args) => commands::configure_sftp::run(cli.config, args),
        Commands::UpsertBlock(args) => commands::upsert_block::run(args),
        Commands::Version => commands::version::run(cli.config),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(help) = e.help() {
            eprintln!("  help: {}", help);
        }
        std::process::exit(1);
    }
}
