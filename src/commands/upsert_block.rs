//! Upsert-block command
//!
//! Exposes the config-block reconciler for any line-oriented file.

use console::Style;

use crate::cli::UpsertBlockArgs;
use crate::error::{HostprovError, Result, fs as fs_error};
use crate::reconcile::{BlockSpec, Outcome, upsert_block, would_change};

/// Run upsert-block command
pub fn run(args: UpsertBlockArgs) -> Result<()> {
    let body = std::fs::read_to_string(&args.body_file).map_err(|e| {
        fs_error::read_failed(args.body_file.display().to_string(), e.to_string())
    })?;
    let spec = BlockSpec::new(
        &args.start,
        &args.end,
        body.lines().map(str::to_string).collect(),
    )?;

    if args.check {
        if would_change(&args.file, &spec)? {
            return Err(HostprovError::BlockDrift {
                path: args.file.display().to_string(),
            });
        }
        println!("{} is up to date", args.file.display());
        return Ok(());
    }

    match upsert_block(&args.file, &spec, args.backup_dir.as_deref())? {
        Outcome::Unchanged => println!("{} is up to date", args.file.display()),
        Outcome::Changed { backup } => println!(
            "{} {} (backup: {})",
            Style::new().green().bold().apply_to("Updated"),
            args.file.display(),
            backup.display()
        ),
    }
    Ok(())
}
