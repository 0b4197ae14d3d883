//! Sampling and the counter acknowledge cycle.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrix_agent::alloc::CountingAllocator;
use metrix_agent::collector::{Collector, POLL_COUNT, RANDOM_VALUE};

static COUNTING: CountingAllocator = CountingAllocator::new();

#[test]
fn poll_sets_random_value_and_counts_polls() {
    let c = Collector::new(None);
    assert!(c.counter(POLL_COUNT).is_none());

    c.poll();
    c.poll();
    c.poll();

    assert_eq!(c.counter(POLL_COUNT), Some(3));
    let r = c.gauge(RANDOM_VALUE).unwrap();
    assert!((0.0..1.0).contains(&r));
    assert!(c.gauge("NumCPU").unwrap() >= 1.0);
}

#[test]
fn allocator_gauges_need_an_allocator() {
    let without = Collector::new(None);
    without.poll();
    assert!(without.gauge("Alloc").is_none());
    assert!(without.gauge("HeapObjects").is_none());

    let with = Collector::new(Some(&COUNTING));
    with.poll();
    for name in ["Alloc", "HeapAlloc", "TotalAlloc", "Mallocs", "Frees", "HeapObjects"] {
        assert!(with.gauge(name).is_some(), "{name} missing");
    }
}

#[cfg(target_os = "linux")]
#[test]
fn proc_stats_on_linux() {
    let c = Collector::new(None);
    c.poll();
    assert!(c.gauge("Sys").unwrap() > 0.0);
    assert!(c.gauge("NumThreads").unwrap() >= 1.0);
    assert!(c.gauge("TotalMemory").unwrap() > 0.0);
}

#[test]
fn snapshot_lists_gauges_then_counters_sorted() {
    let c = Collector::new(None);
    c.poll();

    let snap = c.snapshot();
    let (gauges, counters): (Vec<_>, Vec<_>) = snap.iter().partition(|r| r.mtype == "gauge");
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].id, POLL_COUNT);
    assert_eq!(counters[0].delta, Some(1));
    assert_eq!(snap.last().unwrap().id, POLL_COUNT);

    let ids: Vec<_> = gauges.iter().map(|r| r.id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert!(gauges.iter().all(|r| r.value.is_some() && r.delta.is_none()));
}

#[test]
fn acknowledge_keeps_increments_made_in_flight() {
    let c = Collector::new(None);
    c.poll();
    c.poll();
    let sent = c.snapshot();

    c.poll();
    c.acknowledge(&sent);
    assert_eq!(c.counter(POLL_COUNT), Some(1));

    c.acknowledge(&c.snapshot());
    assert!(c.counter(POLL_COUNT).is_none());
    assert!(c.gauge(RANDOM_VALUE).is_some());
}
