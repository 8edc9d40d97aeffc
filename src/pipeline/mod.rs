//! Provisioning pipeline
//!
//! Drives every batch row through normalization, the account backend and the
//! database backend, in input order, one row at a time:
//!
//! 1. rows that do not normalize, or repeat an earlier identity, are skipped
//! 2. the operating-system account is created or adopted
//! 3. the database schema and user are ensured with a fresh secret
//! 4. the outcome goes to the [`OutcomeSink`] before the next row starts
//!
//! A failing row never stops the batch. Only errors that no later row could
//! survive (lost database connection, missing privilege) end the run early,
//! and they are reported in [`RunSummary::aborted`] after the row that hit
//! them has been recorded.

use std::collections::HashSet;
use std::fmt;

use crate::accounts::{AccountStore, ensure_account};
use crate::batch::BatchRow;
use crate::config::{RotationPolicy, Settings};
use crate::database::DatabaseBackend;
use crate::error::{HostprovError, Result};
use crate::identity::{CanonicalIdentity, Normalized, Rejection, normalize_row};
use crate::preflight::Preconditions;
use crate::secret::{self, Secret};
use crate::ui::ProgressReporter;


/// Final state of a provisioned row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operating-system account was created by this run
    Created,
    /// The account already existed and was brought up to date
    Updated,
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::Updated => "updated",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything known about one identity after it went through the backends
#[derive(Debug, Clone)]
pub struct ProvisioningOutcome {
    pub line: u64,
    /// Identifier as given in the batch, trimmed
    pub student_id: String,
    pub identity: CanonicalIdentity,
    pub os_password: Option<Secret>,
    pub db_password: Option<Secret>,
    pub status: Status,
    pub error: Option<String>,
}

impl ProvisioningOutcome {
    /// Human-readable remark for the report
    pub fn note(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }
        match (&self.os_password, &self.db_password) {
            (Some(_), Some(_)) => String::new(),
            (None, None) => "credentials unchanged".to_string(),
            (None, Some(_)) => "linux password unchanged".to_string(),
            (Some(_), None) => "mysql password unchanged".to_string(),
        }
    }
}

/// What happened to one input row
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Skipped {
        line: u64,
        student_id: String,
        reason: Rejection,
    },
    Provisioned(ProvisioningOutcome),
}

/// Destination of provisioned outcomes, written as soon as each exists
pub trait OutcomeSink {
    fn record(&mut self, outcome: &ProvisioningOutcome) -> Result<()>;
}

impl OutcomeSink for Vec<ProvisioningOutcome> {
    fn record(&mut self, outcome: &ProvisioningOutcome) -> Result<()> {
        self.push(outcome.clone());
        Ok(())
    }
}

/// Row decision made before any backend is touched
#[derive(Debug, Clone)]
pub enum Admission<'r> {
    Accepted {
        row: &'r BatchRow,
        normalized: Normalized,
    },
    Rejected {
        row: &'r BatchRow,
        reason: Rejection,
    },
}

/// Normalize every row and reject repeated identities; the first occurrence wins
pub fn admit(rows: &[BatchRow]) -> Vec<Admission<'_>> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| match normalize_row(row) {
            Ok(normalized) if seen.insert(normalized.identity.id.clone()) => {
                Admission::Accepted { row, normalized }
            }
            Ok(_) => Admission::Rejected {
                row,
                reason: Rejection::DuplicateInBatch,
            },
            Err(reason) => Admission::Rejected { row, reason },
        })
        .collect()
}

/// Outcomes of one run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<RowOutcome>,
    /// Fatal error that stopped the run before every row was processed
    pub aborted: Option<HostprovError>,
}

impl RunSummary {
    pub fn provisioned(&self) -> impl Iterator<Item = &ProvisioningOutcome> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RowOutcome::Provisioned(outcome) => Some(outcome),
            RowOutcome::Skipped { .. } => None,
        })
    }

    pub fn count(&self, status: Status) -> usize {
        self.provisioned()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RowOutcome::Skipped { .. }))
            .count()
    }
}

/// One provisioning run over a batch
pub struct Pipeline<'a> {
    settings: &'a Settings,
    accounts: &'a mut dyn AccountStore,
    database: &'a mut dyn DatabaseBackend,
    _preconditions: Preconditions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: &'a Settings,
        accounts: &'a mut dyn AccountStore,
        database: &'a mut dyn DatabaseBackend,
        preconditions: Preconditions,
    ) -> Self {
        Self {
            settings,
            accounts,
            database,
            _preconditions: preconditions,
        }
    }

    /// Provision every row, streaming outcomes to `sink`
    ///
    /// Returns `Err` only when `sink` fails: a credential that cannot be
    /// recorded must not be followed by more rotations.
    pub fn run(
        &mut self,
        rows: &[BatchRow],
        sink: &mut dyn OutcomeSink,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        reporter.begin(rows.len());

        for admission in admit(rows) {
            let (row, outcome, fatal) = match admission {
                Admission::Rejected { row, reason } => {
                    tracing::info!(line = row.line, reason = reason.reason(), "row skipped");
                    reporter.row_started(row.student_id());
                    let outcome = RowOutcome::Skipped {
                        line: row.line,
                        student_id: row.student_id().to_string(),
                        reason,
                    };
                    (row, outcome, None)
                }
                Admission::Accepted { row, normalized } => {
                    reporter.row_started(row.student_id());
                    if normalized.changed {
                        reporter.notice(&format!(
                            "'{}' normalized to '{}'",
                            row.student_id(),
                            normalized.identity.id
                        ));
                    }
                    let (outcome, fatal) = self.provision(row, normalized.identity);
                    sink.record(&outcome)?;
                    (row, RowOutcome::Provisioned(outcome), fatal)
                }
            };

            reporter.row_finished(&outcome);
            summary.outcomes.push(outcome);

            if let Some(error) = fatal {
                tracing::error!(line = row.line, error = %error, "run aborted");
                reporter.abandon(&error.to_string());
                summary.aborted = Some(error);
                return Ok(summary);
            }
        }

        reporter.finish();
        Ok(summary)
    }

    fn provision(
        &mut self,
        row: &BatchRow,
        identity: CanonicalIdentity,
    ) -> (ProvisioningOutcome, Option<HostprovError>) {
        let id = identity.id.clone();
        let mut outcome = ProvisioningOutcome {
            line: row.line,
            student_id: row.student_id().to_string(),
            identity,
            os_password: None,
            db_password: None,
            status: Status::Failed,
            error: None,
        };

        let account = match ensure_account(self.accounts, self.settings, &outcome.identity) {
            Ok(account) => account,
            Err(failure) => {
                tracing::warn!(
                    account = %id,
                    stage = failure.stage,
                    created = failure.created,
                    error = %failure.error,
                    "account provisioning failed"
                );
                outcome.error = Some(if failure.created {
                    format!(
                        "partial: linux account created, {} not provisioned: {}",
                        failure.stage, failure.error
                    )
                } else {
                    format!("linux account: {failure}")
                });
                let fatal = failure.is_fatal().then(|| HostprovError::PermissionDenied {
                    identity: id.clone(),
                    reason: failure.error.to_string(),
                });
                return (outcome, fatal);
            }
        };
        outcome.os_password = account.password;

        let reset_password = self.settings.rotation == RotationPolicy::Always;
        let db_password = secret::generate(self.settings.secret_length);
        match self
            .database
            .ensure_resource(&id, &db_password, reset_password)
        {
            Ok(state) => {
                if state.password_set {
                    outcome.db_password = Some(db_password);
                }
                outcome.status = if account.created {
                    Status::Created
                } else {
                    Status::Updated
                };
                tracing::info!(account = %id, status = %outcome.status, "provisioned");
                (outcome, None)
            }
            Err(e) => {
                tracing::warn!(account = %id, error = %e, "database provisioning failed");
                outcome.error = Some(format!(
                    "partial: linux account ready, database not provisioned: {e}"
                ));
                let fatal = e.is_fatal().then(|| HostprovError::ConnectionLost {
                    identity: id.clone(),
                    reason: e.to_string(),
                });
                (outcome, fatal)
            }
        }
    }
}
