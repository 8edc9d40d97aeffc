//! Per-identity database resources
//!
//! Every identity gets a schema and a user of the same name, with all
//! privileges on that schema only. [`DatabaseBackend`] is the administrative
//! boundary; [`resource_statements`] is the idempotent statement batch the
//! MySQL backend sends for one identity.

pub mod mysql;

use thiserror::Error;

use crate::secret::Secret;

pub use mysql::MysqlAdmin;

/// Failure of a database operation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatabaseError {
    /// The administrative connection is unusable; no later row can succeed
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A statement failed on a live connection
    #[error("statement failed: {0}")]
    Statement(String),
}

impl DatabaseError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DatabaseError::ConnectionLost(_))
    }
}

/// What `ensure_resource` found and changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceState {
    /// The database user did not exist before
    pub user_created: bool,
    /// The supplied password is now the user's password
    pub password_set: bool,
}

/// Administrative operations on the database server
pub trait DatabaseBackend {
    /// Round-trip a trivial query on the administrative connection
    fn verify_connectivity(&mut self) -> Result<(), DatabaseError>;

    /// Whether `'id'@'<grant host>'` exists
    fn user_exists(&mut self, id: &str) -> Result<bool, DatabaseError>;

    /// Ensure schema `id`, user `id` and its grant exist
    ///
    /// A newly created user always gets `password`. An existing user gets it
    /// only when `reset_password` is set.
    fn ensure_resource(
        &mut self,
        id: &str,
        password: &Secret,
        reset_password: bool,
    ) -> Result<ResourceState, DatabaseError>;
}

impl<T: DatabaseBackend + ?Sized> DatabaseBackend for &mut T {
    fn verify_connectivity(&mut self) -> Result<(), DatabaseError> {
        (**self).verify_connectivity()
    }

    fn user_exists(&mut self, id: &str) -> Result<bool, DatabaseError> {
        (**self).user_exists(id)
    }

    fn ensure_resource(
        &mut self,
        id: &str,
        password: &Secret,
        reset_password: bool,
    ) -> Result<ResourceState, DatabaseError> {
        (**self).ensure_resource(id, password, reset_password)
    }
}

/// Quote an identifier with backticks
pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote a string literal with single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Statement batch that brings one identity's resources to the desired state
///
/// Every statement is safe to repeat.
pub fn resource_statements(
    id: &str,
    grant_host: &str,
    password: &Secret,
    reset_password: bool,
) -> Vec<String> {
    let schema = quote_ident(id);
    let account = format!("{}@{}", quote_literal(id), quote_literal(grant_host));
    let secret = quote_literal(password.expose());

    let mut statements = vec![
        format!("CREATE DATABASE IF NOT EXISTS {schema};"),
        format!("CREATE USER IF NOT EXISTS {account} IDENTIFIED BY {secret};"),
    ];
    if reset_password {
        statements.push(format!("ALTER USER {account} IDENTIFIED BY {secret};"));
    }
    statements.push(format!(
        "GRANT ALL PRIVILEGES ON {schema}.* TO {account};"
    ));
    statements.push("FLUSH PRIVILEGES;".to_string());
    statements
}
