//! metrix agent: samples process runtime statistics and reports them to a
//! metrix server.
//!
//! - `collector`: local gauge/counter maps fed by every poll
//! - `runtime` / `alloc`: the enumerated statistics
//! - `reporter`: gzip + `HashSHA256` batch upload with retry
//! - `agent`: the poll and report loops

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod agent;
pub mod alloc;
pub mod collector;
pub mod config;
pub mod reporter;
pub mod runtime;
