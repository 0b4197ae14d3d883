//! HTTP transport: JSON API, deprecated path endpoints, dashboard page, and
//! request middleware.

pub mod http;
pub mod legacy;
pub mod middleware;
pub mod page;
