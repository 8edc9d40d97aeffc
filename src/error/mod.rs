//! Error types and handling for hostprov
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Only errors that terminate a command live here. Per-row backend failures are
//! modelled by [`crate::accounts::AccountError`] and [`crate::database::DatabaseError`]
//! and are only promoted to a [`HostprovError`] when they are fatal for the run.
//!
//! Constructor helpers are grouped by domain:
//! - [`config`]: Configuration errors
//! - [`fs`]: File system errors
//! - [`preflight`]: Precondition errors

pub mod config;
pub mod fs;
pub mod preflight;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for hostprov operations
#[derive(Error, Diagnostic, Debug)]
pub enum HostprovError {
    // Precondition errors
    #[error("hostprov must run with root privileges")]
    #[diagnostic(
        code(hostprov::preflight::not_privileged),
        help("Re-run with sudo; account and database provisioning cannot succeed otherwise")
    )]
    NotPrivileged,

    #[error("Required tool not found on PATH: {tool}")]
    #[diagnostic(
        code(hostprov::preflight::tool_missing),
        help("Install the package that provides '{tool}' and try again")
    )]
    ToolNotFound { tool: String },

    #[error("Group '{group}' does not exist")]
    #[diagnostic(
        code(hostprov::preflight::group_missing),
        help("Create it first, e.g. 'groupadd {group}'")
    )]
    GroupNotFound { group: String },

    #[error("Directory does not exist: {path}")]
    #[diagnostic(code(hostprov::preflight::directory_missing))]
    DirectoryNotFound { path: String },

    #[error("Cannot reach the database as administrator: {reason}")]
    #[diagnostic(
        code(hostprov::preflight::database_unreachable),
        help(
            "Check --admin-user/--admin-host and supply the password via HOSTPROV_DB_PASSWORD or --password-file"
        )
    )]
    DatabaseUnreachable { reason: String },

    #[error("Another provisioning run holds the lock at {path}")]
    #[diagnostic(
        code(hostprov::preflight::run_in_progress),
        help("Wait for the other run to finish; concurrent runs would race on password rotation")
    )]
    RunInProgress { path: String },

    #[error("Failed to acquire lock {path}: {reason}")]
    #[diagnostic(code(hostprov::preflight::lock_failed))]
    LockFailed { path: String, reason: String },

    // Mid-batch fatal errors
    #[error("Database connection lost while provisioning '{identity}': {reason}")]
    #[diagnostic(
        code(hostprov::run::connection_lost),
        help("Rows already written to the report are valid; re-run the batch to finish the rest")
    )]
    ConnectionLost { identity: String, reason: String },

    #[error("Insufficient privilege while provisioning '{identity}': {reason}")]
    #[diagnostic(
        code(hostprov::run::permission_denied),
        help("No remaining row can succeed without root; re-run with sudo")
    )]
    PermissionDenied { identity: String, reason: String },

    // Input errors
    #[error("Failed to read batch file {path}: {reason}")]
    #[diagnostic(
        code(hostprov::batch::read_failed),
        help("Expected CSV columns: first_name,last_name,student_id")
    )]
    BatchReadFailed { path: String, reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(hostprov::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file {path}: {reason}")]
    #[diagnostic(code(hostprov::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(hostprov::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to read configuration file {path}: {reason}")]
    #[diagnostic(code(hostprov::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    // Reconciler errors
    #[error("Invalid block pattern '{pattern}': {reason}")]
    #[diagnostic(code(hostprov::reconcile::invalid_pattern))]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid block: {reason}")]
    #[diagnostic(
        code(hostprov::reconcile::invalid_block),
        help("The first body line must match --start and no other body line may match --start or --end, except a closing marker as the last line")
    )]
    InvalidBlock { reason: String },

    #[error("Reload command '{command}' failed: {reason}")]
    #[diagnostic(
        code(hostprov::reconcile::reload_failed),
        help("The configuration file was updated; reload the service manually")
    )]
    ReloadFailed { command: String, reason: String },

    #[error("{path} is out of date")]
    #[diagnostic(
        code(hostprov::reconcile::drift),
        help("Run the same command without --check to update it")
    )]
    BlockDrift { path: String },

    // Report errors
    #[error("Failed to write report {path}: {reason}")]
    #[diagnostic(
        code(hostprov::report::write_failed),
        help("Generated passwords exist only in this report; do not re-run before fixing the report directory")
    )]
    ReportWriteFailed { path: String, reason: String },

    // Interaction
    #[error("Confirmation required")]
    #[diagnostic(
        code(hostprov::confirm::required),
        help("Pass --yes to provision without an interactive prompt")
    )]
    ConfirmationRequired,

    #[error("Aborted by user")]
    #[diagnostic(code(hostprov::confirm::aborted))]
    Aborted,

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(hostprov::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {reason}")]
    #[diagnostic(code(hostprov::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file {path}: {reason}")]
    #[diagnostic(code(hostprov::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(hostprov::fs::io_error))]
    IoError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<std::io::Error> for HostprovError {
    fn from(err: std::io::Error) -> Self {
        HostprovError::IoError {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<inquire::InquireError> for HostprovError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled
            | inquire::InquireError::OperationInterrupted => HostprovError::Aborted,
            other => HostprovError::IoError {
                message: format!("Failed to read confirmation: {other}"),
                source: Some(Box::new(other)),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, HostprovError>;
