//! Configure-sftp command

use std::path::PathBuf;

use crate::cli::ConfigureSftpArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::operations::{ConfigureSftpOperation, ConfigureSftpOptions};

/// Run configure-sftp command
pub fn run(config: Option<PathBuf>, args: ConfigureSftpArgs) -> Result<()> {
    let settings = Settings::load(config.as_deref())?;
    ConfigureSftpOperation::new(&settings, ConfigureSftpOptions::from(&args)).execute()?;
    Ok(())
}
