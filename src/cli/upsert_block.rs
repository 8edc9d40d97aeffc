use clap::Parser;
use std::path::PathBuf;

/// Arguments for the upsert-block command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Replace a marker-delimited block:\n    \
                   hostprov upsert-block /etc/php/php.ini --start '^; BEGIN hostprov$' --end '^; END hostprov$' --body-file block.ini\n\n\
                   Fail when a file drifted (exit code 1):\n    \
                   hostprov upsert-block /etc/ssh/sshd_config --start '^Match Group sftpusers$' --end '^Match ' --body-file sftp.conf --check")]
pub struct UpsertBlockArgs {
    /// Configuration file to update
    pub file: PathBuf,

    /// Regex matching the first line of the block
    #[arg(long, value_name = "REGEX")]
    pub start: String,

    /// Regex matching the line after the block, or its closing marker
    #[arg(long, value_name = "REGEX")]
    pub end: String,

    /// File holding the desired block, first line included
    #[arg(long, value_name = "FILE")]
    pub body_file: PathBuf,

    /// Directory for the timestamped backup (defaults to the file's directory)
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Exit with an error if the file would change, without writing
    #[arg(long)]
    pub check: bool,
}
