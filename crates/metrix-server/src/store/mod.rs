//! Metric storage behind one capability trait.
//!
//! Two backends implement [`MetricStore`]:
//! - [`MemoryStore`]: per-kind concurrent maps; batches apply in order and
//!   stop at the first bad record without undoing earlier ones.
//! - [`SqlStore`]: SQLite table; batches run in one transaction and roll
//!   back entirely on any failure.
//!
//! Handlers only ever see `Arc<dyn MetricStore>`.

pub mod memory;
pub mod sql;

use std::collections::BTreeMap;

use async_trait::async_trait;

use metrix_core::error::Result;
use metrix_core::protocol::{DumpRecord, WireRecord};
use metrix_core::{MetricKind, MetricValue};

pub use memory::MemoryStore;
pub use sql::SqlStore;

#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Backend name for logs.
    fn backend(&self) -> &'static str;

    /// Canonical string values of one kind; `None` when `kind` is unknown.
    async fn get(&self, kind: &str) -> Result<Option<BTreeMap<String, String>>>;

    /// Typed snapshot of every metric.
    async fn get_all(&self) -> Result<Snapshot>;

    /// Apply one raw update and return the stored result.
    async fn update_one(&self, kind: &str, name: &str, raw: &str) -> Result<MetricValue>;

    async fn update_batch(&self, records: &[WireRecord]) -> Result<()>;

    /// Storage health check.
    async fn ping(&self) -> Result<()>;
}

/// Typed copy of a metric set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub gauges: BTreeMap<String, f64>,
    pub counters: BTreeMap<String, i64>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.gauges.len() + self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, kind: MetricKind, name: &str) -> Option<MetricValue> {
        match kind {
            MetricKind::Gauge => self.gauges.get(name).copied().map(MetricValue::Gauge),
            MetricKind::Counter => self.counters.get(name).copied().map(MetricValue::Counter),
        }
    }

    pub fn insert(&mut self, name: String, value: MetricValue) {
        match value {
            MetricValue::Gauge(v) => {
                self.gauges.insert(name, v);
            }
            MetricValue::Counter(v) => {
                self.counters.insert(name, v);
            }
        }
    }

    /// Counters first, then gauges, each sorted by name.
    pub fn to_dump_records(&self) -> Vec<DumpRecord> {
        let counters = self
            .counters
            .iter()
            .map(|(k, v)| DumpRecord::new(k.clone(), MetricValue::Counter(*v)));
        let gauges = self
            .gauges
            .iter()
            .map(|(k, v)| DumpRecord::new(k.clone(), MetricValue::Gauge(*v)));
        counters.chain(gauges).collect()
    }
}
