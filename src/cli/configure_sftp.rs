use clap::Parser;

/// Arguments for the configure-sftp command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Check whether sshd_config is up to date:\n    hostprov configure-sftp --dry-run\n\n\
                   Update without reloading sshd:\n    sudo hostprov configure-sftp --no-reload")]
pub struct ConfigureSftpArgs {
    /// Report whether the block would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not run the reload command after a change
    #[arg(long)]
    pub no_reload: bool,
}
