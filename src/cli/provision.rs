use clap::Parser;
use std::path::PathBuf;

use crate::config::RotationPolicy;

/// Arguments for the provision command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Preview a batch:\n    hostprov provision students.csv --dry-run\n\n\
                   Provision with a password file:\n    sudo hostprov provision students.csv --password-file /root/.mysql-admin\n\n\
                   Keep existing passwords:\n    sudo hostprov provision students.csv --rotate on-create\n\n\
                   The administrator password is read from HOSTPROV_DB_PASSWORD or --password-file.")]
pub struct ProvisionArgs {
    /// CSV batch with columns first_name,last_name,student_id
    pub input: PathBuf,

    /// Domain used to print each student's web URL
    #[arg(long)]
    pub domain: Option<String>,

    /// Database administrator user
    #[arg(long, value_name = "USER")]
    pub admin_user: Option<String>,

    /// Database server host
    #[arg(long, value_name = "HOST")]
    pub admin_host: Option<String>,

    /// File whose first line is the database administrator password
    #[arg(long, value_name = "FILE")]
    pub password_file: Option<PathBuf>,

    /// Directory for the credential report
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// When to replace existing passwords
    #[arg(long, value_enum, value_name = "POLICY")]
    pub rotate: Option<RotationPolicy>,

    /// Show what would be provisioned without touching the host
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}
