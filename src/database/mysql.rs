//! MySQL/MariaDB backend over one administrative connection
//!
//! The connection is opened once, before the batch, and reused for every
//! identity. Connecting and every statement batch run under a time limit;
//! running out of time counts as a lost connection since the session state
//! is unknown afterwards.

use std::future::Future;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError};
use tokio::runtime::{Builder, Runtime};

use super::{DatabaseBackend, DatabaseError, ResourceState, resource_statements};
use crate::config::DatabaseSettings;
use crate::secret::Secret;

/// Server error numbers that end the session
const SESSION_ENDED_ERRORS: &[u16] = &[
    1053, // server shutdown in progress
    1152, // aborted connection
    1159, // read timeout on the network
    1161, // write timeout on the network
    1927, // connection killed
    4031, // disconnected for inactivity
];

/// Administrative connection to the database server
pub struct MysqlAdmin {
    runtime: Runtime,
    connection: MySqlConnection,
    grant_host: String,
    connect_timeout: Duration,
    statement_timeout: Duration,
}

impl MysqlAdmin {
    /// Open the administrative connection, authenticating with `password` if given
    pub fn connect(
        settings: &DatabaseSettings,
        password: Option<&Secret>,
    ) -> Result<Self, DatabaseError> {
        let runtime = runtime()?;
        let connect_timeout = Duration::from_secs(settings.connect_timeout_secs);
        let options = connect_options(settings, password);

        let connection = bounded(&runtime, connect_timeout, "connecting", options.connect())?;
        tracing::debug!(
            user = %settings.admin_user,
            host = %settings.admin_host,
            "database connection established"
        );

        Ok(Self {
            runtime,
            connection,
            grant_host: settings.grant_host.clone(),
            connect_timeout,
            statement_timeout: Duration::from_secs(settings.statement_timeout_secs),
        })
    }
}

impl DatabaseBackend for MysqlAdmin {
    fn verify_connectivity(&mut self) -> Result<(), DatabaseError> {
        let query = sqlx::query("SELECT 1").execute(&mut self.connection);
        bounded(&self.runtime, self.connect_timeout, "SELECT 1", query)?;
        Ok(())
    }

    fn user_exists(&mut self, id: &str) -> Result<bool, DatabaseError> {
        let query =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mysql.user WHERE User = ? AND Host = ?")
                .bind(id)
                .bind(self.grant_host.as_str())
                .fetch_one(&mut self.connection);
        let count = bounded(&self.runtime, self.statement_timeout, "user lookup", query)?;
        Ok(count > 0)
    }

    fn ensure_resource(
        &mut self,
        id: &str,
        password: &Secret,
        reset_password: bool,
    ) -> Result<ResourceState, DatabaseError> {
        let user_created = !self.user_exists(id)?;
        let statements = resource_statements(id, &self.grant_host, password, reset_password);

        tracing::debug!(
            database = id,
            grant_host = %self.grant_host,
            reset_password,
            "applying database statements"
        );
        let connection = &mut self.connection;
        let batch = async move {
            for statement in &statements {
                sqlx::raw_sql(statement).execute(&mut *connection).await?;
            }
            Ok::<(), sqlx::Error>(())
        };
        bounded(&self.runtime, self.statement_timeout, "statement batch", batch)?;

        Ok(ResourceState {
            user_created,
            password_set: user_created || reset_password,
        })
    }
}

fn runtime() -> Result<Runtime, DatabaseError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DatabaseError::ConnectionLost(format!("cannot start database runtime: {e}")))
}

fn connect_options(settings: &DatabaseSettings, password: Option<&Secret>) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&settings.admin_host)
        .port(settings.port)
        .username(&settings.admin_user);
    if let Some(socket) = &settings.socket {
        options = options.socket(socket);
    }
    if let Some(password) = password {
        options = options.password(password.expose());
    }
    // Statements carry generated passwords
    options.disable_statement_logging()
}

/// Drive `future` to completion within `limit`
fn bounded<T, F>(runtime: &Runtime, limit: Duration, what: &str, future: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    runtime
        .block_on(async { tokio::time::timeout(limit, future).await })
        .map_err(|_| DatabaseError::ConnectionLost(format!("{what} timed out after {limit:?}")))?
        .map_err(|e| classify(&e))
}

/// Map a driver error to a row-level or fatal error
fn classify(error: &sqlx::Error) -> DatabaseError {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => DatabaseError::ConnectionLost(error.to_string()),
        sqlx::Error::Database(db_err) => {
            let number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number);
            match number {
                Some(number) if SESSION_ENDED_ERRORS.contains(&number) => {
                    DatabaseError::ConnectionLost(db_err.message().to_string())
                }
                _ => DatabaseError::Statement(db_err.message().to_string()),
            }
        }
        _ => DatabaseError::Statement(error.to_string()),
    }
}
