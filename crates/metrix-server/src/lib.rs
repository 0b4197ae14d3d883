//! metrix server library entry.
//!
//! This crate wires configuration, the storage backends, the dump engine, and
//! the HTTP surface into one server. It is consumed by the binary
//! (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod dump;
pub mod error;
pub mod ops;
pub mod router;
pub mod store;
pub mod transport;
