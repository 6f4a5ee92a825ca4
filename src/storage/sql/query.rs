//! SQL database abstraction trait.

/// Trait for SQL database backends.
///
/// Abstracts over PostgreSQL and SQLite by providing the pool and
/// connection types, query building, and the statement that opens a write
/// transaction.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    /// A single connection checked out of the pool.
    type Connection: Send;

    /// Opens a write transaction on a raw connection.
    const BEGIN: &'static str;

    /// Build a SQL query string from a sea-query SELECT statement.
    fn build_select(stmt: sea_query::SelectStatement) -> String;

    /// Build a SQL query string from a sea-query INSERT statement.
    fn build_insert(stmt: sea_query::InsertStatement) -> String;

    /// Build a SQL query string from a sea-query UPDATE statement.
    fn build_update(stmt: sea_query::UpdateStatement) -> String;
}
