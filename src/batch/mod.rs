//! Batch input ingestion
//!
//! Reads `first_name,last_name,student_id` rows. The header row is not
//! stripped here; the normalizer recognizes and rejects it.

use std::io::Read;
use std::path::Path;

use crate::error::{HostprovError, Result};

/// One raw row of the batch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    /// 1-based line number in the input, 0 for rows built in code
    pub line: u64,
    pub given_name: String,
    pub family_name: String,
    pub raw_identifier: String,
}

impl BatchRow {
    pub fn new(
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        raw_identifier: impl Into<String>,
    ) -> Self {
        Self {
            line: 0,
            given_name: given_name.into(),
            family_name: family_name.into(),
            raw_identifier: raw_identifier.into(),
        }
    }

    /// Identifier as the operator wrote it, for messages and the report
    pub fn student_id(&self) -> &str {
        self.raw_identifier.trim()
    }
}

/// Read all rows from a batch file
pub fn read_batch(path: &Path) -> Result<Vec<BatchRow>> {
    let file = std::fs::File::open(path).map_err(|e| HostprovError::BatchReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_batch(file).map_err(|reason| HostprovError::BatchReadFailed {
        path: path.display().to_string(),
        reason,
    })
}

/// Parse rows from any CSV source
pub fn parse_batch<R: Read>(reader: R) -> std::result::Result<Vec<BatchRow>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        let line = record.position().map_or(0, csv::Position::line);
        let field = |index: usize| clean_field(record.get(index).unwrap_or_default());

        rows.push(BatchRow {
            line,
            given_name: field(0),
            family_name: field(1),
            raw_identifier: field(2),
        });
    }

    Ok(rows)
}

/// Strip `\r` left over from mixed line endings
fn clean_field(field: &str) -> String {
    field.replace('\r', "")
}
