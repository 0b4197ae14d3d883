use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use metrix_core::error::Result;
use metrix_core::metric::{accumulate, parse_counter, parse_gauge, validate_name};
use metrix_core::protocol::WireRecord;
use metrix_core::{MetricKind, MetricValue};

use super::{MetricStore, Snapshot};

/// In-memory store: one map per kind.
///
/// Each update holds the shard lock for its key for the whole
/// read-modify-write, so updates to one metric serialize and readers never
/// see half an update. Different names on different shards proceed in
/// parallel.
#[derive(Default)]
pub struct MemoryStore {
    gauges: DashMap<String, f64>,
    counters: DashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            gauges: DashMap::new(),
            counters: DashMap::new(),
        }
    }

    fn update_kind(&self, kind: MetricKind, name: &str, raw: &str) -> Result<MetricValue> {
        match kind {
            MetricKind::Gauge => {
                let v = parse_gauge(raw)?;
                validate_name(name)?;
                self.gauges.insert(name.to_string(), v);
                Ok(MetricValue::Gauge(v))
            }
            MetricKind::Counter => {
                let delta = parse_counter(raw)?;
                validate_name(name)?;
                let next = match self.counters.entry(name.to_string()) {
                    Entry::Occupied(mut e) => {
                        let next = accumulate(*e.get(), delta)?;
                        *e.get_mut() = next;
                        next
                    }
                    Entry::Vacant(e) => *e.insert(delta),
                };
                Ok(MetricValue::Counter(next))
            }
        }
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, kind: &str) -> Result<Option<BTreeMap<String, String>>> {
        let Ok(kind) = kind.parse::<MetricKind>() else {
            return Ok(None);
        };
        let out = match kind {
            MetricKind::Gauge => self
                .gauges
                .iter()
                .map(|r| (r.key().clone(), MetricValue::Gauge(*r.value()).to_string()))
                .collect(),
            MetricKind::Counter => self
                .counters
                .iter()
                .map(|r| (r.key().clone(), MetricValue::Counter(*r.value()).to_string()))
                .collect(),
        };
        Ok(Some(out))
    }

    async fn get_all(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            gauges: self.gauges.iter().map(|r| (r.key().clone(), *r.value())).collect(),
            counters: self.counters.iter().map(|r| (r.key().clone(), *r.value())).collect(),
        })
    }

    async fn update_one(&self, kind: &str, name: &str, raw: &str) -> Result<MetricValue> {
        self.update_kind(kind.parse()?, name, raw)
    }

    /// Records apply in order; the first failure stops the batch and earlier
    /// records stay applied.
    async fn update_batch(&self, records: &[WireRecord]) -> Result<()> {
        for r in records {
            let (kind, raw) = r.raw_update()?;
            self.update_kind(kind, &r.id, &raw)?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
