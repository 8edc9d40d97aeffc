//! Identifier normalization
//!
//! Turns the free-form identifier column of a batch row into the canonical
//! account name used for the Linux user, the home directory and the MySQL
//! schema/user. Everything here is pure so it can be tested without a host.

use std::fmt;

use crate::batch::BatchRow;

/// Longest name accepted by both `useradd` and MySQL account names
pub const MAX_ID_LEN: usize = 32;

/// Identifier-column values that mark a header row
const HEADER_TOKENS: &[&str] = &["studentid", "studentnumber"];

/// Column labels that mark a header row when they appear in any field
const HEADER_LABELS: &[&str] = &[
    "firstname",
    "lastname",
    "givenname",
    "familyname",
    "surname",
    "studentid",
];

/// A normalized, filesystem- and database-safe identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalIdentity {
    /// Matches `[a-z0-9_]{1,32}`
    pub id: String,
    /// Human-readable name, used as the account comment
    pub display_name: String,
}

impl fmt::Display for CanonicalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Result of a successful normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub identity: CanonicalIdentity,
    /// The raw identifier had to be lower-cased or stripped to get `identity.id`
    pub changed: bool,
}

/// Why a batch row was not turned into an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    HeaderRow,
    EmptyAfterNormalization,
    TooLong,
    DuplicateInBatch,
}

impl Rejection {
    /// Stable reason string shown to operators
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::HeaderRow => "header_row",
            Rejection::EmptyAfterNormalization => "empty_after_normalization",
            Rejection::TooLong => "too_long",
            Rejection::DuplicateInBatch => "duplicate_in_batch",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Lower-case `raw` and drop every character outside `[a-z0-9_]`
pub fn canonicalize(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// Normalize a bare identifier, without name columns
pub fn normalize(raw: &str) -> Result<Normalized, Rejection> {
    normalize_row(&BatchRow::new("", "", raw))
}

/// Normalize a batch row into a canonical identity
pub fn normalize_row(row: &BatchRow) -> Result<Normalized, Rejection> {
    if is_header_row(row) {
        return Err(Rejection::HeaderRow);
    }

    let id = canonicalize(&row.raw_identifier);
    if id.is_empty() {
        return Err(Rejection::EmptyAfterNormalization);
    }
    if id.len() > MAX_ID_LEN {
        return Err(Rejection::TooLong);
    }

    let changed = id != row.raw_identifier;
    let display_name = display_name(&row.given_name, &row.family_name, &id);

    Ok(Normalized {
        identity: CanonicalIdentity { id, display_name },
        changed,
    })
}

fn is_header_row(row: &BatchRow) -> bool {
    let identifier = header_key(&row.raw_identifier);
    if HEADER_TOKENS.contains(&identifier.as_str()) {
        return true;
    }

    [&row.given_name, &row.family_name, &row.raw_identifier]
        .iter()
        .any(|field| HEADER_LABELS.contains(&header_key(field).as_str()))
}

/// Case- and separator-insensitive form used for header matching
fn header_key(field: &str) -> String {
    field
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn display_name(given: &str, family: &str, id: &str) -> String {
    // ':' and ',' would corrupt the GECOS field
    let name = format!("{} {}", given.trim(), family.trim()).replace([':', ','], " ");
    let name = name.trim();
    if name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_and_lowercases() {
        let normalized = normalize("STU-001 ").unwrap();
        assert_eq!(normalized.identity.id, "stu001");
        assert!(normalized.changed);
    }

    #[test]
    fn test_normalize_unchanged_identifier() {
        let normalized = normalize("al_01").unwrap();
        assert_eq!(normalized.identity.id, "al_01");
        assert!(!normalized.changed);
    }

    #[test]
    fn test_normalize_empty_is_rejected() {
        assert_eq!(normalize(""), Err(Rejection::EmptyAfterNormalization));
        assert_eq!(normalize(" -- "), Err(Rejection::EmptyAfterNormalization));
    }

    #[test]
    fn test_normalize_header_token() {
        assert_eq!(normalize("StudentID"), Err(Rejection::HeaderRow));
        assert_eq!(normalize("student_id"), Err(Rejection::HeaderRow));
    }

    #[test]
    fn test_short_generic_identifiers_are_accounts() {
        assert_eq!(normalize("ID").unwrap().identity.id, "id");
        assert_eq!(normalize("UserID").unwrap().identity.id, "userid");
        assert_eq!(normalize("username").unwrap().identity.id, "username");
    }

    #[test]
    fn test_header_label_in_name_column() {
        let row = BatchRow::new("First Name", "Last Name", "S-1");
        assert_eq!(normalize_row(&row), Err(Rejection::HeaderRow));
    }

    #[test]
    fn test_too_long_identifier() {
        let raw = "a".repeat(MAX_ID_LEN + 1);
        assert_eq!(normalize(&raw), Err(Rejection::TooLong));
        assert!(normalize(&"a".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        for raw in ["AL-01", "", "StudentID", "ümlaut_9", "x y z"] {
            assert_eq!(normalize(raw), normalize(raw));
        }
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        assert_eq!(normalize("Jö-42").unwrap().identity.id, "j42");
    }

    #[test]
    fn test_display_name_from_row() {
        let row = BatchRow::new("Ada", "Lovelace", "AL-01");
        let normalized = normalize_row(&row).unwrap();
        assert_eq!(normalized.identity.display_name, "Ada Lovelace");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let normalized = normalize("AL-01").unwrap();
        assert_eq!(normalized.identity.display_name, "al01");
    }

    #[test]
    fn test_display_name_strips_gecos_separators() {
        let row = BatchRow::new("Grace", "Hopper, Jr:", "gh1");
        let normalized = normalize_row(&row).unwrap();
        assert_eq!(normalized.identity.display_name, "Grace Hopper  Jr");
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(Rejection::HeaderRow.reason(), "header_row");
        assert_eq!(
            Rejection::EmptyAfterNormalization.to_string(),
            "empty_after_normalization"
        );
        assert_eq!(Rejection::DuplicateInBatch.reason(), "duplicate_in_batch");
    }
}
