//! Database migrations.

use metrix_core::error::{MetricsError, Result};
use sqlx::SqlitePool;
use tracing::{info, instrument};

const SCHEMA_VERSION: i64 = 1;

#[instrument(skip(pool))]
pub async fn run(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(migration_failed)?;

    let current_version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(migration_failed)?;

    let current_version = current_version.unwrap_or(0);

    if current_version >= SCHEMA_VERSION {
        info!("Database schema is up to date (version {})", current_version);
        return Ok(());
    }

    info!("Migrating database from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        migrate_to_v1(pool).await?;
    }

    Ok(())
}

/// Metrics table; one row per (type, name). Counters use `delta`, gauges
/// use `value`.
#[instrument(skip(pool))]
async fn migrate_to_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration to schema version 1");

    let mut tx = pool.begin().await.map_err(migration_failed)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metrics (
            type TEXT NOT NULL,
            name TEXT NOT NULL,
            delta INTEGER,
            value REAL,
            CONSTRAINT metric_unique UNIQUE (type, name)
        )
        "#,
    )
    .execute(&mut *tx)
    .await
    .map_err(migration_failed)?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (1)")
        .execute(&mut *tx)
        .await
        .map_err(migration_failed)?;

    tx.commit().await.map_err(migration_failed)?;
    Ok(())
}

fn migration_failed(e: sqlx::Error) -> MetricsError {
    MetricsError::StorageUnavailable(format!("migration failed: {e}"))
}
