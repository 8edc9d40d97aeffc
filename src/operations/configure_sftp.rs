//! Configure-sftp operation module
//!
//! Upserts the SFTP `Match Group` block into the sshd configuration and runs
//! the reload command, but only when the file actually changed.

use std::process::Command;

use console::Style;

use crate::cli::ConfigureSftpArgs;
use crate::config::Settings;
use crate::error::{HostprovError, Result};
use crate::reconcile::{Outcome, sshd, upsert_block, would_change};

/// Configuration options for configure-sftp
#[derive(Debug, Clone, Copy)]
pub struct ConfigureSftpOptions {
    pub dry_run: bool,
    pub reload: bool,
}

impl From<&ConfigureSftpArgs> for ConfigureSftpOptions {
    fn from(args: &ConfigureSftpArgs) -> Self {
        Self {
            dry_run: args.dry_run,
            reload: !args.no_reload,
        }
    }
}

/// High-level configure-sftp operation
pub struct ConfigureSftpOperation<'a> {
    settings: &'a Settings,
    options: ConfigureSftpOptions,
}

impl<'a> ConfigureSftpOperation<'a> {
    pub fn new(settings: &'a Settings, options: ConfigureSftpOptions) -> Self {
        Self { settings, options }
    }

    /// Returns the reconciler outcome; `None` for a dry run
    pub fn execute(&self) -> Result<Option<Outcome>> {
        let sftp = &self.settings.sftp;
        let spec = sshd::sftp_block(&self.settings.group, sftp.chroot)?;
        let path = sftp.config_path.as_path();

        if self.options.dry_run {
            if would_change(path, &spec)? {
                println!("{} would be updated with:", path.display());
                for line in spec.body() {
                    println!("  {line}");
                }
            } else {
                println!("{} is up to date", path.display());
            }
            return Ok(None);
        }

        let outcome = upsert_block(path, &spec, sftp.backup_dir.as_deref())?;
        match &outcome {
            Outcome::Unchanged => println!("{} is up to date", path.display()),
            Outcome::Changed { backup } => println!(
                "{} {} (backup: {})",
                Style::new().green().bold().apply_to("Updated"),
                path.display(),
                backup.display()
            ),
        }
        if outcome.is_changed() && self.options.reload {
            reload(&sftp.reload_command)?;
        }

        Ok(Some(outcome))
    }
}

/// Run the configured reload command; empty means no reload
fn reload(command: &[String]) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        tracing::debug!("no reload command configured");
        return Ok(());
    };
    let rendered = command.join(" ");

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| HostprovError::ReloadFailed {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

    if status.success() {
        tracing::info!(command = %rendered, "service reloaded");
        Ok(())
    } else {
        Err(HostprovError::ReloadFailed {
            command: rendered,
            reason: status.to_string(),
        })
    }
}
