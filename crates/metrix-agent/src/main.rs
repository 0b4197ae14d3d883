//! metrix agent
//!
//! - Polls runtime stats every POLL_INTERVAL seconds
//! - Reports a gzip, optionally signed batch every REPORT_INTERVAL seconds

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use metrix_agent::agent::Agent;
use metrix_agent::alloc::CountingAllocator;
use metrix_agent::collector::Collector;
use metrix_agent::config::AgentArgs;
use metrix_agent::reporter::Reporter;
use metrix_core::retry::RetryPolicy;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator::new();

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = match AgentArgs::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let reporter = match Reporter::new(&cfg, RetryPolicy::default()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            std::process::exit(1);
        }
    };

    let agent = Arc::new(Agent::new(cfg, Collector::new(Some(&ALLOC)), reporter));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(agent.run(shutdown_rx));

    metrix_core::shutdown::signal().await;
    let _ = shutdown_tx.send(true);
    if let Err(e) = task.await {
        tracing::error!(error = %e, "agent task failed");
    }
}
