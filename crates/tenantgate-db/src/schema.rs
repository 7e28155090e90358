//! Schema migrations for SQLite.
//!
//! The DDL lives in `migrations/` and is embedded at compile time. UUIDs
//! are stored as lowercase hyphenated strings. Enums are stored as their
//! upper-case names with CHECK constraints. Soft-deleted rows keep a
//! non-null `deleted_at`.

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use tracing::info;

use crate::error::DbError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations, tracked in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    MIGRATOR.run(pool).await?;
    info!(
        migrations = MIGRATOR.iter().count(),
        "Database schema up to date"
    );
    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    include_str!("../migrations/0001_initial_schema.sql")
}
