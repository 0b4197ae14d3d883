//! Shared application state for the metrix server.
//!
//! - Backend selection: a reachable database wins; otherwise the in-memory
//!   store, with the dump engine attached when a dump path is configured.
//! - Handlers reach storage only through `Arc<dyn MetricStore>`.

use std::sync::Arc;

use metrix_core::retry::RetryPolicy;

use crate::config::ServerConfig;
use crate::dump::DumpEngine;
use crate::store::{MemoryStore, MetricStore, SqlStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    store: Arc<dyn MetricStore>,
    dump: Option<Arc<DumpEngine>>,
    retry: RetryPolicy,
}

impl AppState {
    /// Build application state. Storage failures degrade to the in-memory
    /// store instead of aborting startup.
    pub async fn new(cfg: ServerConfig) -> Self {
        if !cfg.database_dsn.is_empty() {
            match SqlStore::connect(&cfg.database_dsn).await {
                Ok(db) => {
                    tracing::info!(backend = "sqlite", "storage selected");
                    return Self::with_store(cfg, Arc::new(db), None, RetryPolicy::default());
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to initialize db, falling back to memory");
                }
            }
        }

        let store: Arc<dyn MetricStore> = Arc::new(MemoryStore::new());
        let dump = DumpEngine::new(&cfg.dump, Arc::clone(&store)).await.map(Arc::new);
        tracing::info!(backend = store.backend(), dump = dump.is_some(), "storage selected");
        Self::with_store(cfg, store, dump, RetryPolicy::default())
    }

    pub fn with_store(
        cfg: ServerConfig,
        store: Arc<dyn MetricStore>,
        dump: Option<Arc<DumpEngine>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, store, dump, retry }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> &Arc<dyn MetricStore> {
        &self.inner.store
    }

    pub fn dump(&self) -> Option<Arc<DumpEngine>> {
        self.inner.dump.clone()
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    pub fn sign_key(&self) -> Option<&[u8]> {
        self.inner.cfg.sign_key()
    }

    /// Hook run after every successful update.
    pub async fn after_update(&self) {
        if let Some(d) = &self.inner.dump {
            d.dump_if_sync().await;
        }
    }
}
