//! Credential report
//!
//! Generated passwords exist nowhere else, so every outcome is written and
//! synced to disk as soon as it is known. The file is created exclusively
//! with mode 0600 and never overwritten.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{HostprovError, Result};
use crate::pipeline::{OutcomeSink, ProvisioningOutcome};
use crate::secret::Secret;

/// Report columns, in order
pub const COLUMNS: [&str; 7] = [
    "student_id",
    "linux_username",
    "linux_password",
    "mysql_username",
    "mysql_password",
    "status",
    "note",
];

/// Streaming CSV writer for one run's report
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl ReportWriter {
    /// Create `hostprov-report-<timestamp>.csv` in `dir` and write the header
    ///
    /// A `-N` suffix is added when the name is already taken.
    pub fn create(dir: &Path, timestamp: DateTime<Local>) -> Result<Self> {
        let stem = format!("hostprov-report-{}", timestamp.format("%Y%m%d-%H%M%S"));

        let mut attempt = 0;
        let (path, file) = loop {
            let name = if attempt == 0 {
                format!("{stem}.csv")
            } else {
                format!("{stem}-{attempt}.csv")
            };
            let path = dir.join(name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(&path)
            {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 1000 => {
                    attempt += 1;
                }
                Err(e) => return Err(write_failed(&path, e)),
            }
        };

        let mut report = Self {
            writer: csv::Writer::from_writer(file),
            path,
            rows: 0,
        };
        report.write_record(&COLUMNS)?;
        tracing::debug!(path = %report.path.display(), "report created");
        Ok(report)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one outcome and sync it to disk
    pub fn record(&mut self, outcome: &ProvisioningOutcome) -> Result<()> {
        let note = outcome.note();
        let id = outcome.identity.id.as_str();
        let record = [
            outcome.student_id.as_str(),
            id,
            outcome.os_password.as_ref().map_or("", Secret::expose),
            id,
            outcome.db_password.as_ref().map_or("", Secret::expose),
            outcome.status.as_str(),
            note.as_str(),
        ];
        self.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// Close the report and return its path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.sync()?;
        Ok(self.path)
    }

    fn write_record(&mut self, record: &[&str]) -> Result<()> {
        self.writer
            .write_record(record)
            .map_err(|e| write_failed(&self.path, e))?;
        self.sync()
    }

    fn sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| write_failed(&self.path, e))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| write_failed(&self.path, e))
    }
}

impl OutcomeSink for ReportWriter {
    fn record(&mut self, outcome: &ProvisioningOutcome) -> Result<()> {
        ReportWriter::record(self, outcome)
    }
}

fn write_failed(path: &Path, err: impl std::fmt::Display) -> HostprovError {
    HostprovError::ReportWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CanonicalIdentity;
    use crate::pipeline::Status;
    use chrono::TimeZone;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write(
        dir: &Path,
        timestamp: DateTime<Local>,
        outcomes: &[ProvisioningOutcome],
    ) -> Result<PathBuf> {
        let mut report = ReportWriter::create(dir, timestamp)?;
        for outcome in outcomes {
            report.record(outcome)?;
        }
        report.finish()
    }

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 9, 1, 8, 30, 0).unwrap()
    }

    fn outcome(status: Status) -> ProvisioningOutcome {
        ProvisioningOutcome {
            line: 1,
            student_id: "AL-01".to_string(),
            identity: CanonicalIdentity {
                id: "al01".to_string(),
                display_name: "Ada Lovelace".to_string(),
            },
            os_password: Some(Secret::new("Os0123456789abcdefgh")),
            db_password: Some(Secret::new("Db0123456789abcdefgh")),
            status,
            error: None,
        }
    }

    #[test]
    fn test_report_contents() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), timestamp(), &[outcome(Status::Created)]).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "hostprov-report-20260901-083000.csv"
        );
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "student_id,linux_username,linux_password,mysql_username,mysql_password,status,note",
                "AL-01,al01,Os0123456789abcdefgh,al01,Db0123456789abcdefgh,created,",
            ]
        );
    }

    #[test]
    fn test_report_is_owner_only() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), timestamp(), &[]).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_existing_report_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let first = write(temp.path(), timestamp(), &[outcome(Status::Created)]).unwrap();
        let second = write(temp.path(), timestamp(), &[]).unwrap();

        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("-1.csv"));
        assert_eq!(std::fs::read_to_string(&first).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_rows_visible_before_finish() {
        let temp = TempDir::new().unwrap();
        let mut report = ReportWriter::create(temp.path(), timestamp()).unwrap();
        report.record(&outcome(Status::Updated)).unwrap();

        let content = std::fs::read_to_string(report.path()).unwrap();
        assert!(content.contains(",updated,"));
        assert_eq!(report.rows(), 1);
    }

    #[test]
    fn test_failed_row_carries_note() {
        let temp = TempDir::new().unwrap();
        let mut failed = outcome(Status::Failed);
        failed.db_password = None;
        failed.error = Some("database: statement failed: ERROR 1396".to_string());

        let path = write(temp.path(), timestamp(), &[failed]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("AL-01,al01,Os0123456789abcdefgh,al01,,failed,"));
        assert!(content.contains("ERROR 1396"));
    }

    #[test]
    fn test_missing_directory() {
        let err = ReportWriter::create(Path::new("/nonexistent/reports"), timestamp()).unwrap_err();
        assert!(matches!(err, HostprovError::ReportWriteFailed { .. }));
    }
}
