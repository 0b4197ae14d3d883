//! Wire formats.
//!
//! - Wire records: JSON `{id, type, delta?, value?}` used by the HTTP API and
//!   the agent's batch reports.
//! - Dump records: JSON `{type, name, value}` string triples used by the file
//!   checkpoint.
//! - Envelope: gzip body encoding and the `HashSHA256` body signature.
//!
//! Decoding never panics: malformed input is reported as `MetricsError`.

pub mod dump;
pub mod envelope;
pub mod wire;

pub use dump::DumpRecord;
pub use wire::WireRecord;
