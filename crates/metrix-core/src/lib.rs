//! metrix core: metric data model, merge rules, wire formats, and retry policy.
//!
//! This crate defines the contracts shared by the collector server and the
//! reporting agent. It carries no HTTP or database dependencies so both sides
//! (and their tests) can reuse it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `MetricsError`/`Result` so malformed updates never crash a
//! process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod protocol;
pub mod retry;
pub mod shutdown;

/// Shared result type.
pub use error::{Result, MetricsError};
pub use metric::{MetricKind, MetricValue};
