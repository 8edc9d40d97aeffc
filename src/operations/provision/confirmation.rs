//! Confirmation before provisioning
//!
//! Provisioning rotates passwords, so a run only proceeds after an explicit
//! yes. Without a terminal to ask on, `--yes` is required.

use std::io::IsTerminal;

use inquire::Confirm;

use crate::error::{HostprovError, Result};

/// Ask the operator to confirm; declining aborts the run
pub fn confirm_provision(accounts: usize, skipped: usize) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        return Err(HostprovError::ConfirmationRequired);
    }

    println!("\n{accounts} account(s) will be provisioned, {skipped} row(s) skipped.");
    println!("Existing passwords may be replaced; the new ones are only written to the report.\n");

    let confirmed = Confirm::new("Proceed with provisioning?")
        .with_default(false)
        .with_help_message("Type 'y' to confirm, or press Enter to cancel")
        .prompt()?;

    if confirmed {
        Ok(())
    } else {
        Err(HostprovError::Aborted)
    }
}
