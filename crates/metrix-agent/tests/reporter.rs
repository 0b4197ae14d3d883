//! Reporting against the real server router and against scripted failures.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Router};

use metrix_agent::agent::Agent;
use metrix_agent::collector::{Collector, POLL_COUNT, RANDOM_VALUE};
use metrix_agent::config::AgentConfig;
use metrix_agent::reporter::{ReportError, Reporter};
use metrix_core::protocol::{envelope, WireRecord};
use metrix_core::retry::RetryPolicy;
use metrix_server::app_state::AppState;
use metrix_server::config::ServerConfig;
use metrix_server::router::build_router;
use metrix_server::store::{MemoryStore, MetricStore};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::with_unit(Duration::from_millis(1))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

async fn metrix_server(key: &str) -> (String, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let cfg = ServerConfig {
        key: key.into(),
        ..ServerConfig::default()
    };
    let state = AppState::with_store(cfg, store.clone(), None, fast_retry());
    (serve(build_router(state)).await, store)
}

/// Server that always answers `status` and counts hits.
async fn scripted(status: StatusCode) -> (String, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let h = Arc::clone(&hits);
    let app = Router::new().route(
        "/updates/",
        post(move || {
            let h = Arc::clone(&h);
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                status
            }
        }),
    );
    (serve(app).await, hits)
}

fn agent(address: &str, key: &str) -> Agent {
    let cfg = AgentConfig {
        address: address.into(),
        key: key.into(),
        ..AgentConfig::default()
    };
    let reporter = Reporter::new(&cfg, fast_retry()).unwrap();
    Agent::new(cfg, Collector::new(None), reporter)
}

#[tokio::test]
async fn poll_count_reaches_server_as_deltas() {
    let (addr, store) = metrix_server("").await;
    let a = agent(&addr, "");

    a.collector().poll();
    a.collector().poll();
    let sent = a.report_once().await.unwrap();
    assert!(sent >= 2);
    assert!(a.collector().counter(POLL_COUNT).is_none());

    let snap = store.get_all().await.unwrap();
    assert_eq!(snap.counters[POLL_COUNT], 2);
    assert_eq!(snap.gauges[RANDOM_VALUE], a.collector().gauge(RANDOM_VALUE).unwrap());

    a.collector().poll();
    a.report_once().await.unwrap();
    assert_eq!(store.get_all().await.unwrap().counters[POLL_COUNT], 3);
}

#[tokio::test]
async fn signed_batch_is_accepted_by_keyed_server() {
    let (addr, store) = metrix_server("secret").await;
    let a = agent(&addr, "secret");
    a.collector().poll();
    a.report_once().await.unwrap();
    assert_eq!(store.get_all().await.unwrap().counters[POLL_COUNT], 1);
}

#[tokio::test]
async fn key_mismatch_is_final_and_keeps_deltas() {
    let (addr, store) = metrix_server("secret").await;
    let a = agent(&addr, "wrong");
    a.collector().poll();

    let err = a.report_once().await.unwrap_err();
    assert!(matches!(err, ReportError::Status { status: 400, .. }));
    assert!(!err.is_retryable());
    assert_eq!(a.collector().counter(POLL_COUNT), Some(1));
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn server_errors_are_retried_three_times() {
    let (addr, hits) = scripted(StatusCode::INTERNAL_SERVER_ERROR).await;
    let a = agent(&addr, "");
    a.collector().poll();

    let err = a.report_once().await.unwrap_err();
    assert!(matches!(err, ReportError::Status { status: 500, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(a.collector().counter(POLL_COUNT), Some(1));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (addr, hits) = scripted(StatusCode::BAD_REQUEST).await;
    let a = agent(&addr, "");
    a.collector().poll();

    assert!(a.report_once().await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_server_is_a_retryable_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let a = agent(&addr, "");
    a.collector().poll();
    let err = a.report_once().await.unwrap_err();
    assert!(matches!(err, ReportError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn empty_batch_sends_nothing() {
    let (addr, hits) = scripted(StatusCode::OK).await;
    let a = agent(&addr, "");
    assert_eq!(a.report_once().await.unwrap(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn payload_is_gzip_and_signed_over_plain_body() {
    let cfg = AgentConfig {
        key: "secret".into(),
        ..AgentConfig::default()
    };
    let reporter = Reporter::new(&cfg, fast_retry()).unwrap();
    let records = vec![WireRecord::counter(POLL_COUNT, 4)];

    let payload = reporter.encode(&records).unwrap();
    let plain = envelope::decompress(&payload.body, 1 << 20).unwrap();
    let decoded: Vec<WireRecord> = serde_json::from_slice(&plain).unwrap();
    assert_eq!(decoded, records);

    let sig = payload.signature.unwrap();
    assert!(envelope::verify(b"secret", &plain, &sig).unwrap());
}

#[test]
fn unsigned_without_key() {
    let reporter = Reporter::new(&AgentConfig::default(), fast_retry()).unwrap();
    let payload = reporter.encode(&[WireRecord::gauge(RANDOM_VALUE, 0.5)]).unwrap();
    assert!(payload.signature.is_none());
}
