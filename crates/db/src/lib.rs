// crates/db/src/lib.rs
// PostgreSQL session for reading pg_stat_statements, plans and index definitions.

mod queries;
mod rows;

pub use rows::Row;

use range_advisor_core::{DatabaseConfig, SslMode};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgDatabaseError, PgSslMode};
use sqlx::query::Query;
use sqlx::{Connection, PgConnection, Postgres};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Failed to connect to {target}: {message}")]
    Connection { target: String, message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("EXPLAIN returned no rows")]
    EmptyPlan,

    #[error("Database session is closed")]
    Closed,
}

impl DbError {
    fn query(error: &sqlx::Error) -> Self {
        DbError::Query {
            message: format_db_error(error),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Positional statement parameter (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

impl SqlParam {
    fn bind_to<'q>(&self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParam::Text(v) => query.bind(v.clone()),
            SqlParam::Int(v) => query.bind(*v),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

/// A single database session.
///
/// Every statement runs in its own transaction. The session is closed with
/// [`Database::close`] or [`disconnect`]; after that, statements fail with
/// [`DbError::Closed`].
pub struct Database {
    conn: Option<PgConnection>,
    target: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("target", &self.target)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

impl Database {
    /// Open a session, giving up after `connect_timeout_secs`.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.dbname)
            .ssl_mode(match config.ssl_mode {
                SslMode::Disable => PgSslMode::Disable,
                SslMode::Prefer => PgSslMode::Prefer,
                SslMode::Require => PgSslMode::Require,
            })
            .application_name("range-advisor");
        if let Some(password) = config.resolved_password() {
            options = options.password(&password);
        }
        Self::connect_with(options, Duration::from_secs(config.connect_timeout_secs)).await
    }

    /// Open a session from prepared options (e.g. parsed from a URL).
    pub async fn connect_with(options: PgConnectOptions, timeout: Duration) -> DbResult<Self> {
        let target = format!(
            "{}:{}/{} as {}",
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default(),
            options.get_username()
        );

        // A timed-out connect future is dropped, which releases its socket.
        let conn = match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(DbError::Connection {
                    target,
                    message: format_db_error(&e),
                })
            }
            Err(_) => {
                return Err(DbError::Connection {
                    target,
                    message: format!("timed out after {}s", timeout.as_secs()),
                })
            }
        };

        info!(db = %target, "connected to database");
        Ok(Self {
            conn: Some(conn),
            target,
        })
    }

    /// Close the session. Calling it again is a no-op; close errors are logged.
    pub async fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match conn.close().await {
            Ok(()) => info!(db = %self.target, "database connection closed"),
            Err(e) => warn!(db = %self.target, error = %e, "error closing database connection"),
        }
    }

    /// Run `statement` and commit. On failure the transaction is rolled back
    /// and the error returned.
    pub async fn execute(&mut self, statement: &str, params: &[SqlParam]) -> DbResult<Vec<Row>> {
        self.run(statement, params, true).await
    }

    /// `SELECT version()`.
    pub async fn server_version(&mut self) -> DbResult<String> {
        let rows = self.execute("SELECT version() AS version", &[]).await?;
        Ok(rows
            .first()
            .and_then(|r| r.get("version"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string())
    }

    async fn run(&mut self, statement: &str, params: &[SqlParam], commit: bool) -> DbResult<Vec<Row>> {
        let conn = self.conn.as_mut().ok_or(DbError::Closed)?;
        let mut tx = conn.begin().await.map_err(|e| DbError::query(&e))?;

        let query = params
            .iter()
            .fold(sqlx::query(statement), |q, p| p.bind_to(q));

        match query.fetch_all(&mut *tx).await {
            Ok(pg_rows) => {
                let finished = if commit {
                    tx.commit().await
                } else {
                    tx.rollback().await
                };
                finished.map_err(|e| DbError::query(&e))?;
                Ok(pg_rows.iter().map(rows::decode_row).collect())
            }
            Err(e) => {
                let err = DbError::query(&e);
                tracing::error!(error = %err, "error executing query");
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Close `session` if there is one. Safe with `None` and with a session
/// that is already closed.
pub async fn disconnect(session: Option<Database>) {
    if let Some(mut db) = session {
        db.close().await;
    }
}

/// Server message with SQLSTATE, detail and hint when the server sent them.
fn format_db_error(error: &sqlx::Error) -> String {
    let Some(pg) = error
        .as_database_error()
        .and_then(|e| e.try_downcast_ref::<PgDatabaseError>())
    else {
        return error.to_string();
    };

    let mut message = format!("{} (SQLSTATE {})", pg.message(), pg.code());
    if let Some(detail) = pg.detail().filter(|d| !d.trim().is_empty()) {
        message.push_str(&format!(" (detail: {detail})"));
    }
    if let Some(hint) = pg.hint().filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!(" (hint: {hint})"));
    }
    message
}
