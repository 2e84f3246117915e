//! `SQLite` schema bootstrap logic.
//!
//! Uses `CREATE TABLE IF NOT EXISTS`, so it is safe to re-run on every
//! startup. The table is never seeded: a fresh database has no whitelist
//! document until an operator imports one.

use sqlx::SqlitePool;

use crate::Result;

/// Create the whitelist document table.
///
/// # Errors
///
/// Returns `AppError::Db` if the DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS whitelist_document (
    collection      TEXT PRIMARY KEY NOT NULL,
    document        TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
