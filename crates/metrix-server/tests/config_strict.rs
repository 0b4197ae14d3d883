//! Config parsing is strict and validated; flags override the file.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metrix_server::config::{load_from_file, load_from_str, ServerArgs};

#[test]
fn empty_document_takes_defaults() {
    let cfg = load_from_str("{}").unwrap();
    assert_eq!(cfg.address, "localhost:8080");
    assert_eq!(cfg.dump.store_interval, 300);
    assert_eq!(cfg.dump.file_storage_path, "/tmp/metrics-db.json");
    assert!(cfg.dump.restore);
    assert!(cfg.database_dsn.is_empty());
    assert!(cfg.sign_key().is_none());
}

#[test]
fn full_document_parses() {
    let yaml = r#"
address: "0.0.0.0:9090"
key: "secret"
database_dsn: "sqlite::memory:"
dump:
  store_interval: 0
  file_storage_path: ""
  restore: false
"#;
    let cfg = load_from_str(yaml).unwrap();
    assert_eq!(cfg.address, "0.0.0.0:9090");
    assert_eq!(cfg.sign_key(), Some(&b"secret"[..]));
    assert!(!cfg.dump.enabled());
    assert!(cfg.dump.interval().is_zero());
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(load_from_str("adress: \"localhost:1\"\n").is_err());
    assert!(load_from_str("dump:\n  interval: 5\n").is_err());
}

#[test]
fn invalid_values_are_rejected() {
    assert!(load_from_str("address: \"\"\n").is_err());
    assert!(load_from_str("address: \"8080\"\n").is_err());
    assert!(load_from_str("dump:\n  store_interval: 100000\n").is_err());
}

#[test]
fn missing_file_is_an_error() {
    assert!(load_from_file("/nonexistent/metrix.yaml").is_err());
}

#[test]
fn flags_override_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.yaml");
    std::fs::write(&path, "address: \"localhost:7000\"\nkey: \"from-file\"\n").unwrap();

    let args = ServerArgs {
        config: Some(path.display().to_string()),
        address: Some("127.0.0.1:9000".into()),
        store_interval: Some(0),
        ..ServerArgs::default()
    };
    let cfg = args.into_config().unwrap();
    assert_eq!(cfg.address, "127.0.0.1:9000");
    assert_eq!(cfg.key, "from-file");
    assert_eq!(cfg.dump.store_interval, 0);
}

#[test]
fn overrides_are_validated() {
    let args = ServerArgs {
        address: Some("nope".into()),
        ..ServerArgs::default()
    };
    assert!(args.into_config().is_err());
}
