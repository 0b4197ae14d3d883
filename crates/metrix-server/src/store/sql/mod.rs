//! Relational backend on SQLite.
//!
//! Gauges are a single upsert keyed by `metric_unique (type, name)`.
//! Counters are read-then-write: select the stored value, add the delta in
//! application code, then insert or update. Outside a serializable
//! transaction two writers can both see "absent" and race on the insert; the
//! loser gets a unique violation, reported as `UniqueConstraintRace` so the
//! caller's retry loop can try again. Two writers that both see a present row
//! can still lose one delta.
//!
//! Batches run in a deferred transaction. When two batches on a file
//! database both read before writing, SQLite refuses the second upgrade
//! (`SQLITE_BUSY`, `SQLITE_BUSY_SNAPSHOT`); that is reported as
//! `WriteConflict`, the transaction rolls back, and the caller retries.

pub mod migrations;

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{info, instrument};

use metrix_core::error::{MetricsError, Result};
use metrix_core::metric::{accumulate, parse_counter, parse_gauge, validate_name};
use metrix_core::protocol::WireRecord;
use metrix_core::{MetricKind, MetricValue};

use super::{MetricStore, Snapshot};

#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// In-memory database (tests).
    pub async fn new_in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open the pool, check connectivity, and run migrations.
    #[instrument]
    pub async fn connect(dsn: &str) -> Result<Self> {
        if dsn.is_empty() {
            return Err(MetricsError::StorageUnavailable("empty database url".into()));
        }

        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(|e| MetricsError::StorageUnavailable(e.to_string()))?
            .create_if_missing(true);

        // An in-memory database lives and dies with its connection, so the
        // pool must hold exactly one and never recycle it.
        let in_memory = dsn.contains(":memory:") || dsn.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| MetricsError::StorageUnavailable(e.to_string()))?;

        migrations::run(&pool).await?;

        info!("sql store ready");
        Ok(Self { pool })
    }
}

fn db_err(e: sqlx::Error) -> MetricsError {
    match &e {
        sqlx::Error::Database(d) if d.is_unique_violation() => {
            MetricsError::UniqueConstraintRace(d.message().to_string())
        }
        sqlx::Error::Database(d) if is_busy(d.code().as_deref()) => {
            MetricsError::WriteConflict(d.message().to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => MetricsError::StorageUnavailable(e.to_string()),
        _ => MetricsError::Internal(format!("database: {e}")),
    }
}

/// `SQLITE_BUSY` and its extended codes (primary code 5).
fn is_busy(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| c & 0xff == 5)
}

/// One logical update on an open connection (pooled or transactional).
async fn apply_update(
    conn: &mut SqliteConnection,
    kind: MetricKind,
    name: &str,
    raw: &str,
) -> Result<MetricValue> {
    match kind {
        MetricKind::Gauge => {
            let v = parse_gauge(raw)?;
            validate_name(name)?;

            sqlx::query(
                "INSERT INTO metrics (type, name, value) VALUES (?, ?, ?) \
                 ON CONFLICT (type, name) DO UPDATE SET value = excluded.value",
            )
            .bind(kind.as_str())
            .bind(name)
            .bind(v)
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;

            Ok(MetricValue::Gauge(v))
        }
        MetricKind::Counter => {
            let delta = parse_counter(raw)?;
            validate_name(name)?;

            let current: Option<i64> = sqlx::query_scalar(
                "SELECT COALESCE(delta, 0) FROM metrics WHERE type = ? AND name = ?",
            )
            .bind(kind.as_str())
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_err)?;

            let next = match current {
                None => {
                    sqlx::query("INSERT INTO metrics (type, name, delta) VALUES (?, ?, ?)")
                        .bind(kind.as_str())
                        .bind(name)
                        .bind(delta)
                        .execute(&mut *conn)
                        .await
                        .map_err(db_err)?;
                    delta
                }
                Some(prev) => {
                    let next = accumulate(prev, delta)?;
                    sqlx::query("UPDATE metrics SET delta = ? WHERE type = ? AND name = ?")
                        .bind(next)
                        .bind(kind.as_str())
                        .bind(name)
                        .execute(&mut *conn)
                        .await
                        .map_err(db_err)?;
                    next
                }
            };

            Ok(MetricValue::Counter(next))
        }
    }
}

fn row_value(kind: MetricKind, row: &sqlx::sqlite::SqliteRow) -> Result<MetricValue> {
    match kind {
        MetricKind::Gauge => {
            let v: Option<f64> = row.try_get("value").map_err(db_err)?;
            Ok(MetricValue::Gauge(v.unwrap_or_default()))
        }
        MetricKind::Counter => {
            let v: Option<i64> = row.try_get("delta").map_err(db_err)?;
            Ok(MetricValue::Counter(v.unwrap_or_default()))
        }
    }
}

#[async_trait]
impl MetricStore for SqlStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self))]
    async fn get(&self, kind: &str) -> Result<Option<BTreeMap<String, String>>> {
        let Ok(kind) = kind.parse::<MetricKind>() else {
            return Ok(None);
        };

        let rows = sqlx::query("SELECT name, delta, value FROM metrics WHERE type = ?")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut out = BTreeMap::new();
        for row in &rows {
            let name: String = row.try_get("name").map_err(db_err)?;
            out.insert(name, row_value(kind, row)?.to_string());
        }
        Ok(Some(out))
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Snapshot> {
        let rows = sqlx::query("SELECT type, name, delta, value FROM metrics")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut snap = Snapshot::default();
        for row in &rows {
            let mtype: String = row.try_get("type").map_err(db_err)?;
            let Ok(kind) = mtype.parse::<MetricKind>() else {
                tracing::warn!(mtype = %mtype, "skipping row with unknown metric type");
                continue;
            };
            let name: String = row.try_get("name").map_err(db_err)?;
            snap.insert(name, row_value(kind, row)?);
        }
        Ok(snap)
    }

    #[instrument(skip(self))]
    async fn update_one(&self, kind: &str, name: &str, raw: &str) -> Result<MetricValue> {
        let kind: MetricKind = kind.parse()?;
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        apply_update(&mut conn, kind, name, raw).await
    }

    /// All records commit together or none do: any failure drops the
    /// transaction, which rolls it back.
    #[instrument(skip(self, records), fields(records = records.len()))]
    async fn update_batch(&self, records: &[WireRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for r in records {
            let (kind, raw) = r.raw_update()?;
            apply_update(&mut tx, kind, &r.id, &raw).await?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| MetricsError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}
