//! Local metric accumulator.
//!
//! Gauges hold the latest sample. Counters hold the delta not yet
//! acknowledged by the server: [`Collector::acknowledge`] subtracts what a
//! successful report carried, so increments made while the report was in
//! flight survive for the next one.

use dashmap::DashMap;

use metrix_core::protocol::WireRecord;

use crate::alloc::CountingAllocator;
use crate::runtime;

pub const POLL_COUNT: &str = "PollCount";
pub const RANDOM_VALUE: &str = "RandomValue";

pub struct Collector {
    gauges: DashMap<String, f64>,
    counters: DashMap<String, i64>,
    alloc: Option<&'static CountingAllocator>,
}

impl Collector {
    /// `alloc` is the process's installed global allocator, if it counts.
    pub fn new(alloc: Option<&'static CountingAllocator>) -> Self {
        Self {
            gauges: DashMap::new(),
            counters: DashMap::new(),
            alloc,
        }
    }

    /// Take one sample of every available statistic.
    pub fn poll(&self) {
        for (name, value) in runtime::sample(self.alloc.map(CountingAllocator::stats)) {
            self.gauges.insert(name.to_string(), value);
        }
        self.gauges.insert(RANDOM_VALUE.to_string(), rand::random::<f64>());
        *self.counters.entry(POLL_COUNT.to_string()).or_insert(0) += 1;

        tracing::debug!(gauges = self.gauges.len(), "polled runtime stats");
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).map(|v| *v)
    }

    pub fn counter(&self, name: &str) -> Option<i64> {
        self.counters.get(name).map(|v| *v)
    }

    /// Every metric as wire records: gauges then counters, each sorted by name.
    pub fn snapshot(&self) -> Vec<WireRecord> {
        let mut gauges: Vec<_> = self
            .gauges
            .iter()
            .map(|e| WireRecord::gauge(e.key().clone(), *e.value()))
            .collect();
        gauges.sort_by(|a, b| a.id.cmp(&b.id));

        let mut counters: Vec<_> = self
            .counters
            .iter()
            .map(|e| WireRecord::counter(e.key().clone(), *e.value()))
            .collect();
        counters.sort_by(|a, b| a.id.cmp(&b.id));

        gauges.extend(counters);
        gauges
    }

    /// Subtract the counter deltas of a delivered batch. Counters that drop
    /// to zero are removed so an idle agent stops reporting them.
    pub fn acknowledge(&self, sent: &[WireRecord]) {
        for r in sent {
            let Some(delta) = r.delta else { continue };
            if let Some(mut current) = self.counters.get_mut(&r.id) {
                *current -= delta;
            }
            self.counters.remove_if(&r.id, |_, v| *v == 0);
        }
    }
}
