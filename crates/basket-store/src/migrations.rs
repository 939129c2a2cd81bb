//! # Database Migrations
//!
//! Embedded SQL migrations for the local cache.
//!
//! The `sqlx::migrate!()` macro embeds all SQL files from
//! `migrations/sqlite/` into the binary at compile time; no runtime file
//! access is needed. Migrations are tracked in `_sqlx_migrations`, run in
//! filename order, and are idempotent - concurrent callers racing to
//! initialize are serialized by sqlx, so only one real initialization
//! occurs.
//!
//! This is a client-side cache: a schema version bump is allowed to drop and
//! recreate tables rather than carry data forward.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Safe to call multiple times and from racing callers.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}

/// Returns (total embedded migrations, applied migrations) for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
