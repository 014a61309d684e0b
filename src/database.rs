//! `SQLite` connection pooling and schema migrations for the Diesel adapters.
//!
//! Every pooled connection enables foreign-key enforcement so that deleting
//! an issue cascades to its history, comments and images, and sets a busy
//! timeout so concurrent writers wait for the database lock instead of
//! failing immediately.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// `SQLite` connection pool shared by issue and user repositories.
pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Schema migrations applied in order by [`run_migrations`].
///
/// Every statement is idempotent, so re-running against an up-to-date
/// database is harmless.
pub const MIGRATIONS: [(&str, &str); 2] = [
    (
        "2026-10-19-000000_create_users",
        include_str!("../migrations/2026-10-19-000000_create_users/up.sql"),
    ),
    (
        "2026-10-19-000001_create_issue_tables",
        include_str!("../migrations/2026-10-19-000001_create_issue_tables/up.sql"),
    ),
];

/// Errors raised while opening or migrating the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The connection pool could not be built or a connection checked out.
    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),

    /// A migration script failed.
    #[error("migration {name} failed: {source}")]
    Migration {
        /// Migration directory name.
        name: &'static str,
        /// Underlying Diesel error.
        source: diesel::result::Error,
    },
}

/// Per-connection pragmas applied when a connection is checked out.
#[derive(Debug, Clone, Copy)]
struct SqliteConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteConnectionOptions {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(&format!(
                "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
                self.busy_timeout.as_millis()
            ))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Opens a connection pool for the database at `url`.
///
/// # Errors
///
/// Returns [`DatabaseError::Pool`] when no connection can be established.
pub fn connect(url: &str, max_size: u32, busy_timeout: Duration) -> Result<SqlitePool, DatabaseError> {
    let manager = ConnectionManager::<SqliteConnection>::new(url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqliteConnectionOptions { busy_timeout }))
        .build(manager)?;
    info!(url, max_size, "opened sqlite pool");
    Ok(pool)
}

/// Opens a single-connection pool over a private in-memory database.
///
/// The connection is never recycled, because an in-memory database lives
/// only as long as its connection.
///
/// # Errors
///
/// Returns [`DatabaseError::Pool`] when the connection cannot be opened.
pub fn connect_in_memory() -> Result<SqlitePool, DatabaseError> {
    let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
    let pool = Pool::builder()
        .max_size(1)
        .max_lifetime(None)
        .idle_timeout(None)
        .connection_customizer(Box::new(SqliteConnectionOptions {
            busy_timeout: Duration::from_secs(5),
        }))
        .build(manager)?;
    Ok(pool)
}

/// Applies every entry of [`MIGRATIONS`].
///
/// # Errors
///
/// Returns [`DatabaseError`] when a connection cannot be obtained or a
/// migration script fails.
pub fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let mut connection = pool.get()?;
    for (name, sql) in MIGRATIONS {
        connection
            .batch_execute(sql)
            .map_err(|source| DatabaseError::Migration { name, source })?;
        debug!(migration = name, "applied migration");
    }
    Ok(())
}

/// Encodes a timestamp as fixed-width RFC 3339 text, so that lexicographic
/// order matches chronological order.
pub(crate) fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decodes a timestamp written by [`encode_timestamp`].
pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|timestamp| timestamp.with_timezone(&Utc))
}
