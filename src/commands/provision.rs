//! Provision command
//!
//! Resolves settings, command-line overrides and the administrator password
//! once, then hands everything to [`ProvisionOperation`].

use std::path::{Path, PathBuf};

use crate::cli::ProvisionArgs;
use crate::config::Settings;
use crate::error::{Result, fs as fs_error};
use crate::operations::{ProvisionOperation, ProvisionOptions};
use crate::secret::Secret;

/// Environment variable holding the database administrator password
pub const PASSWORD_ENV: &str = "HOSTPROV_DB_PASSWORD";

/// Run provision command
pub fn run(config: Option<PathBuf>, args: ProvisionArgs) -> Result<()> {
    let mut settings = Settings::load(config.as_deref())?;
    apply_overrides(&mut settings, &args);
    settings.validate()?;

    let admin_password = if args.dry_run {
        None
    } else {
        admin_password(
            std::env::var(PASSWORD_ENV).ok(),
            settings.database.password_file.as_deref(),
        )?
    };

    ProvisionOperation::new(&settings, ProvisionOptions::from(&args)).execute(admin_password)
}

fn apply_overrides(settings: &mut Settings, args: &ProvisionArgs) {
    if let Some(domain) = &args.domain {
        settings.domain = Some(domain.clone());
    }
    if let Some(user) = &args.admin_user {
        settings.database.admin_user = user.clone();
    }
    if let Some(host) = &args.admin_host {
        settings.database.admin_host = host.clone();
    }
    if let Some(file) = &args.password_file {
        settings.database.password_file = Some(file.clone());
    }
    if let Some(dir) = &args.report_dir {
        settings.report_dir = dir.clone();
    }
    if let Some(rotation) = args.rotate {
        settings.rotation = rotation;
    }
}

/// Administrator password from the environment, else the first line of `file`
fn admin_password(from_env: Option<String>, file: Option<&Path>) -> Result<Option<Secret>> {
    if let Some(password) = from_env.filter(|password| !password.is_empty()) {
        return Ok(Some(Secret::new(password)));
    }
    let Some(file) = file else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(file)
        .map_err(|e| fs_error::read_failed(file.display().to_string(), e.to_string()))?;
    let password = content.lines().next().unwrap_or_default();
    Ok(Some(Secret::new(password)))
}
