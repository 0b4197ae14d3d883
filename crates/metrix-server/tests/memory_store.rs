//! In-memory backend: merge rules, validation, batch partial failure, and
//! same-key concurrency.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use metrix_core::protocol::WireRecord;
use metrix_core::{MetricValue, MetricsError};
use metrix_server::store::{MemoryStore, MetricStore};

#[tokio::test]
async fn gauge_update_reads_back_as_decimal_string() {
    let store = MemoryStore::new();
    store.update_one("gauge", "temp", "1.0").await.unwrap();
    let v = store.update_one("gauge", "temp", "2.5").await.unwrap();
    assert_eq!(v, MetricValue::Gauge(2.5));

    let gauges = store.get("gauge").await.unwrap().unwrap();
    assert_eq!(gauges["temp"], "2.5");

    store.update_one("gauge", "temp", "2.5").await.unwrap();
    assert_eq!(store.get("gauge").await.unwrap().unwrap()["temp"], "2.5");
}

#[tokio::test]
async fn counter_accumulates() {
    let store = MemoryStore::new();
    store.update_one("counter", "requests", "5").await.unwrap();
    let v = store.update_one("counter", "requests", "3").await.unwrap();
    assert_eq!(v, MetricValue::Counter(8));
    assert_eq!(store.get("counter").await.unwrap().unwrap()["requests"], "8");
}

#[tokio::test]
async fn names_are_independent_per_kind() {
    let store = MemoryStore::new();
    store.update_one("gauge", "x", "1.5").await.unwrap();
    store.update_one("counter", "x", "2").await.unwrap();

    let snap = store.get_all().await.unwrap();
    assert_eq!(snap.gauges["x"], 1.5);
    assert_eq!(snap.counters["x"], 2);
    assert_eq!(snap.len(), 2);
}

#[tokio::test]
async fn empty_name_leaves_store_unchanged() {
    let store = MemoryStore::new();
    for kind in ["gauge", "counter"] {
        let err = store.update_one(kind, "", "1").await.unwrap_err();
        assert!(matches!(err, MetricsError::InvalidName));
    }
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn fractional_counter_is_invalid_value() {
    let store = MemoryStore::new();
    let err = store.update_one("counter", "requests", "1.5").await.unwrap_err();
    assert!(matches!(err, MetricsError::InvalidValue(_)));
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_kind() {
    let store = MemoryStore::new();
    assert!(store.get("histogram").await.unwrap().is_none());
    let err = store.update_one("histogram", "x", "1").await.unwrap_err();
    assert!(matches!(err, MetricsError::UnknownMetricType(_)));
}

#[tokio::test]
async fn batch_stops_at_first_bad_record_without_rollback() {
    let store = MemoryStore::new();
    let batch = vec![
        WireRecord::counter("a", 1),
        WireRecord::gauge("", 2.0),
        WireRecord::counter("b", 3),
    ];

    let err = store.update_batch(&batch).await.unwrap_err();
    assert!(matches!(err, MetricsError::InvalidName));

    let snap = store.get_all().await.unwrap();
    assert_eq!(snap.counters.get("a"), Some(&1));
    assert!(!snap.counters.contains_key("b"));
}

#[tokio::test]
async fn batch_record_without_payload_is_rejected() {
    let store = MemoryStore::new();
    let mut r = WireRecord::counter("a", 1);
    r.delta = None;
    let err = store.update_batch(&[r]).await.unwrap_err();
    assert!(matches!(err, MetricsError::MissingValue { .. }));
}

#[tokio::test]
async fn concurrent_increments_on_one_counter_are_not_lost() {
    let store = Arc::new(MemoryStore::new());
    let mut tasks = Vec::new();
    for _ in 0..16 {
        let s = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            for _ in 0..100 {
                s.update_one("counter", "hits", "1").await.unwrap();
            }
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }
    assert_eq!(store.get_all().await.unwrap().counters["hits"], 1600);
}
