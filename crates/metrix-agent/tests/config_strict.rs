#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use metrix_agent::config::{load_from_str, AgentArgs};

#[test]
fn defaults() {
    let cfg = load_from_str("{}").unwrap();
    assert_eq!(cfg.address, "localhost:8080");
    assert_eq!(cfg.poll(), Duration::from_secs(2));
    assert_eq!(cfg.report(), Duration::from_secs(10));
    assert!(cfg.sign_key().is_none());
    assert_eq!(cfg.endpoint(), "http://localhost:8080/updates/");
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(load_from_str("pollInterval: 3\n").is_err());
}

#[test]
fn intervals_must_be_positive() {
    assert!(load_from_str("poll_interval: 0\n").is_err());
    assert!(load_from_str("report_interval: 0\n").is_err());
}

#[test]
fn flags_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.yaml");
    std::fs::write(&path, "address: \"10.0.0.1:8080\"\npoll_interval: 5\n").unwrap();

    let cfg = AgentArgs {
        config: Some(path.display().to_string()),
        report_interval: Some(30),
        key: Some("k".into()),
        ..AgentArgs::default()
    }
    .into_config()
    .unwrap();

    assert_eq!(cfg.address, "10.0.0.1:8080");
    assert_eq!(cfg.poll_interval, 5);
    assert_eq!(cfg.report_interval, 30);
    assert_eq!(cfg.sign_key(), Some(&b"k"[..]));
}
