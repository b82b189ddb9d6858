//! Schema migrations, embedded from `migrations/sqlite` at compile time.
//!
//! Files are applied in numeric order and recorded in `_sqlx_migrations`.
//! A shipped migration is never edited; schema changes go in a new
//! `NNN_description.sql` file.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool)
        .await
        .unwrap_or((MIGRATOR.migrations.len(), 0));
    info!(total, applied, "Applying pending migrations");

    MIGRATOR.run(pool).await?;

    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` counts. Before the first run the bookkeeping
/// table does not exist and this returns an error.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((MIGRATOR.migrations.len(), applied.max(0) as usize))
}
