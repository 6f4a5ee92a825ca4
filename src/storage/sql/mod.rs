//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based storage backends
//! (PostgreSQL, SQLite). The implementations are parameterized by database type
//! using the `SqlDatabase` trait and generated per backend by macro.

mod directory;
mod ledger;
mod query;
mod records;
mod run_log;

pub use directory::SqlDirectoryStore;
pub use ledger::SqlLedgerStore;
pub use query::SqlDatabase;
pub use run_log::SqlRunLogStore;

use super::StorageError;

/// Map a unique-constraint violation to a domain error, passing anything
/// else through.
pub(crate) fn on_unique_violation(
    e: sqlx::Error,
    conflict: impl FnOnce() -> StorageError,
) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict(),
        _ => StorageError::Database(e),
    }
}

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::{PgConnection, PgPool};

    use crate::storage::Result;
    use crate::utils::bootstrap::connect_with_retry;

    /// Schema migrations for PostgreSQL.
    pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;
        type Connection = PgConnection;

        const BEGIN: &'static str = "BEGIN";

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// Connect to PostgreSQL, retrying with backoff while the server comes up.
    pub async fn connect_postgres(uri: &str, max_connections: u32) -> Result<PgPool> {
        let pool = connect_with_retry("postgres", || {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(uri)
        })
        .await?;
        Ok(pool)
    }

    /// PostgreSQL directory store.
    pub type PostgresDirectoryStore = super::SqlDirectoryStore<Postgres>;

    /// PostgreSQL ledger store.
    pub type PostgresLedgerStore = super::SqlLedgerStore<Postgres>;

    /// PostgreSQL run log store.
    pub type PostgresRunLogStore = super::SqlRunLogStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use std::path::Path;
    use std::str::FromStr;

    use sea_query::SqliteQueryBuilder;
    use sqlx::migrate::Migrator;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::{SqliteConnection, SqlitePool};

    use crate::storage::Result;
    use crate::utils::bootstrap::connect_with_retry;

    /// Schema migrations for SQLite.
    pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;
        type Connection = SqliteConnection;

        // BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
        // when concurrent DEFERRED transactions race to upgrade from shared to exclusive.
        const BEGIN: &'static str = "BEGIN IMMEDIATE";

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// Open (creating if needed) the database file at `path`.
    ///
    /// `:memory:` opens a private in-memory database on a single connection.
    pub async fn connect_sqlite(path: &str, max_connections: u32) -> Result<SqlitePool> {
        let in_memory = path == ":memory:";
        if !in_memory {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool_options = if in_memory {
            // The database lives only as long as its one connection.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = connect_with_retry("sqlite", || {
            pool_options.clone().connect_with(options.clone())
        })
        .await?;
        Ok(pool)
    }

    /// SQLite directory store.
    pub type SqliteDirectoryStore = super::SqlDirectoryStore<Sqlite>;

    /// SQLite ledger store.
    pub type SqliteLedgerStore = super::SqlLedgerStore<Sqlite>;

    /// SQLite run log store.
    pub type SqliteRunLogStore = super::SqlRunLogStore<Sqlite>;
}
