//! Precondition errors
//!
//! Everything here aborts a run before any account or database is touched.

use super::HostprovError;

/// Creates a missing tool error
pub fn tool_not_found(tool: impl Into<String>) -> HostprovError {
    HostprovError::ToolNotFound { tool: tool.into() }
}

/// Creates a missing group error
pub fn group_not_found(group: impl Into<String>) -> HostprovError {
    HostprovError::GroupNotFound {
        group: group.into(),
    }
}

/// Creates a missing directory error
pub fn directory_not_found(path: impl Into<String>) -> HostprovError {
    HostprovError::DirectoryNotFound { path: path.into() }
}

/// Creates a database unreachable error
pub fn database_unreachable(reason: impl Into<String>) -> HostprovError {
    HostprovError::DatabaseUnreachable {
        reason: reason.into(),
    }
}

/// Creates a run-in-progress error
pub fn run_in_progress(path: impl Into<String>) -> HostprovError {
    HostprovError::RunInProgress { path: path.into() }
}

/// Creates a lock failure error
pub fn lock_failed(path: impl Into<String>, reason: impl Into<String>) -> HostprovError {
    HostprovError::LockFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
