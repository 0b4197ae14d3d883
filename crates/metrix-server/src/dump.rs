//! File checkpoint of the whole metric set.
//!
//! - Restore on start: every dumped record is replayed through the store's
//!   update path. A missing or unreadable file means "start empty".
//! - Periodic mode (`store_interval > 0`): a background task dumps on every
//!   tick.
//! - Sync mode (`store_interval == 0`): no ticker; update handlers call
//!   [`DumpEngine::dump_if_sync`] after every successful update.
//! - Shutdown: one final dump in either mode.
//!
//! Each dump overwrites the file via a temporary sibling and a rename.
//! Dumps are serialized: the snapshot and the write happen under one lock,
//! so files land in snapshot order.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use metrix_core::error::Result;
use metrix_core::protocol::dump;

use crate::config::DumpConfig;
use crate::store::MetricStore;

pub struct DumpEngine {
    path: PathBuf,
    interval: Duration,
    store: Arc<dyn MetricStore>,
    write_lock: Mutex<()>,
}

impl DumpEngine {
    /// Returns `None` when no dump path is configured. Restores first when
    /// `cfg.restore` is set.
    pub async fn new(cfg: &DumpConfig, store: Arc<dyn MetricStore>) -> Option<Self> {
        if !cfg.enabled() {
            tracing::info!("dumping to file disabled");
            return None;
        }

        let engine = Self {
            path: PathBuf::from(&cfg.file_storage_path),
            interval: cfg.interval(),
            store,
            write_lock: Mutex::new(()),
        };

        if cfg.restore {
            match engine.restore().await {
                Ok(n) => tracing::info!(path = %engine.path.display(), restored = n, "metrics restored"),
                Err(e) => tracing::error!(path = %engine.path.display(), error = %e, "failed to restore"),
            }
        }

        Some(engine)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_sync(&self) -> bool {
        self.interval.is_zero()
    }

    /// Replay the dump file into the store. Records the store rejects are
    /// logged and skipped. Returns how many were applied.
    pub async fn restore(&self) -> Result<usize> {
        let bytes = tokio::fs::read(&self.path).await?;
        let records = dump::decode(&bytes)?;

        let mut applied = 0;
        for r in &records {
            match self.store.update_one(&r.mtype, &r.name, &r.value).await {
                Ok(_) => applied += 1,
                Err(e) => {
                    tracing::error!(mtype = %r.mtype, name = %r.name, error = %e, "failed to restore record")
                }
            }
        }
        Ok(applied)
    }

    /// Write the current metric set. Returns how many records were written.
    pub async fn dump(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.store.get_all().await?;
        let records = snapshot.to_dump_records();
        let bytes = dump::encode(&records)?;

        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "dumped metrics");
        Ok(records.len())
    }

    /// Dump now if running in sync mode. Failures only log.
    pub async fn dump_if_sync(&self) {
        if self.is_sync() {
            self.dump_logged().await;
        }
    }

    async fn dump_logged(&self) {
        if let Err(e) = self.dump().await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to save dump");
        }
    }

    /// Background loop. Exits after a final dump once `shutdown` flips to
    /// true or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        if self.is_sync() {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        } else {
            let mut tick = interval_at(Instant::now() + self.interval, self.interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = tick.tick() => {
                        tracing::info!("dumping to file");
                        self.dump_logged().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(path = %self.path.display(), "final dump before shutdown");
        self.dump_logged().await;
    }
}
