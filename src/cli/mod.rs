//! CLI definitions using clap derive API
//!
//! One submodule per command's argument types:
//! - provision: Provision command arguments
//! - configure_sftp: Configure-sftp command arguments
//! - upsert_block: Upsert-block command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod configure_sftp;
pub mod provision;
pub mod upsert_block;

pub use completions::CompletionsArgs;
pub use configure_sftp::ConfigureSftpArgs;
pub use provision::ProvisionArgs;
pub use upsert_block::UpsertBlockArgs;

/// hostprov - student web hosting provisioner
///
/// Creates SFTP-only accounts, web directories and MySQL databases from a batch of students.
#[derive(Parser, Debug)]
#[command(
    name = "hostprov",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Provision student web hosting accounts from a CSV batch",
    long_about = "hostprov provisions per-student hosting: an SFTP-only Linux account, a \
                  public_html directory and a MySQL database with its own user. Re-running \
                  a batch is safe; existing accounts are updated, never duplicated.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  hostprov provision students.csv --dry-run   \x1b[90m# Show what would be provisioned\x1b[0m\n   \
                  sudo hostprov provision students.csv -y     \x1b[90m# Provision without prompting\x1b[0m\n   \
                  sudo hostprov configure-sftp                \x1b[90m# Restrict the group to SFTP\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Settings file (defaults to /etc/hostprov/config.yaml when present)
    #[arg(long, short = 'c', global = true, env = "HOSTPROV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision accounts, web directories and databases from a CSV batch
    Provision(ProvisionArgs),

    /// Restrict the student group to chrooted SFTP in sshd_config
    #[command(name = "configure-sftp")]
    ConfigureSftp(ConfigureSftpArgs),

    /// Insert or replace a delimited block in a configuration file
    #[command(name = "upsert-block")]
    UpsertBlock(UpsertBlockArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["hostprov", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "hostprov",
            "-v",
            "--config",
            "/tmp/hostprov.yaml",
            "configure-sftp",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/hostprov.yaml")));
        assert!(matches!(cli.command, Commands::ConfigureSftp(_)));
    }

    #[test]
    fn test_cli_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["hostprov", "configure-sftp", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["hostprov"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
