//! File system errors

use super::HostprovError;

/// Creates a file not found error
pub fn not_found(path: impl Into<String>) -> HostprovError {
    HostprovError::FileNotFound { path: path.into() }
}

/// Creates a file read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> HostprovError {
    HostprovError::FileReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: impl Into<String>, reason: impl Into<String>) -> HostprovError {
    HostprovError::FileWriteFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
