//! Provision operation module
//!
//! This module provides ProvisionOperation, which wraps the provisioning
//! workflow: read the batch, verify the host, take the run lock, confirm,
//! then stream every outcome through the pipeline into the report.

pub mod confirmation;
pub mod display;

use std::path::PathBuf;

use chrono::Local;

use crate::accounts::SystemAccounts;
use crate::batch::read_batch;
use crate::cli::ProvisionArgs;
use crate::config::Settings;
use crate::database::MysqlAdmin;
use crate::error::{Result, preflight as preflight_error};
use crate::lock::FileGuard;
use crate::pipeline::{Admission, Pipeline, admit};
use crate::preflight::{self, SystemProbe};
use crate::report::ReportWriter;
use crate::secret::Secret;
use crate::ui::InteractiveProgressReporter;

/// Configuration options for provisioning
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub input: PathBuf,
    pub dry_run: bool,
    pub yes: bool,
}

impl From<&ProvisionArgs> for ProvisionOptions {
    fn from(args: &ProvisionArgs) -> Self {
        Self {
            input: args.input.clone(),
            dry_run: args.dry_run,
            yes: args.yes,
        }
    }
}

/// High-level provision operation
pub struct ProvisionOperation<'a> {
    settings: &'a Settings,
    options: ProvisionOptions,
}

impl<'a> ProvisionOperation<'a> {
    pub fn new(settings: &'a Settings, options: ProvisionOptions) -> Self {
        Self { settings, options }
    }

    /// Run the batch; `admin_password` authenticates the database client
    pub fn execute(&self, admin_password: Option<Secret>) -> Result<()> {
        let rows = read_batch(&self.options.input)?;
        tracing::debug!(rows = rows.len(), input = %self.options.input.display(), "batch read");

        if self.options.dry_run {
            print!("{}", display::render_plan(self.settings, &admit(&rows)));
            return Ok(());
        }

        let (preconditions, mut database) = preflight::verify(self.settings, &SystemProbe, || {
            MysqlAdmin::connect(&self.settings.database, admin_password.as_ref())
        })?;

        let lock_path = self.settings.run_lock_path();
        let guard = FileGuard::try_acquire(&lock_path)?
            .ok_or_else(|| preflight_error::run_in_progress(lock_path.display().to_string()))?;
        tracing::debug!(lock = %guard.path().display(), "holding run lock");

        let accepted = admit(&rows)
            .iter()
            .filter(|admission| matches!(admission, Admission::Accepted { .. }))
            .count();
        if !self.options.yes {
            confirmation::confirm_provision(accepted, rows.len() - accepted)?;
        }

        let mut report = ReportWriter::create(&self.settings.report_dir, Local::now())?;
        let mut accounts = SystemAccounts::new();
        let mut reporter = InteractiveProgressReporter::new();

        let result = Pipeline::new(self.settings, &mut accounts, &mut database, preconditions)
            .run(&rows, &mut report, &mut reporter);

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                display::print_report_location(report.path(), report.rows());
                return Err(e);
            }
        };

        let rows_written = report.rows();
        let path = report.finish()?;
        display::print_summary(self.settings, &summary);
        display::print_report_location(&path, rows_written);

        match summary.aborted {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
