//! metrix server
//!
//! - JSON API: /update/, /updates/, /value/, dashboard at /
//! - Storage: SQLite when DATABASE_DSN connects, in-memory otherwise
//! - Dump engine: periodic or per-update checkpoint, final dump on shutdown

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use metrix_server::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = match config::ServerArgs::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    let listen = cfg.address.clone();

    let state = app_state::AppState::new(cfg).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dump_task = state.dump().map(|d| tokio::spawn(d.run(shutdown_rx)));

    let app = router::build_router(state);

    tracing::info!(%listen, "metrix-server starting");
    let listener = tokio::net::TcpListener::bind(&listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(metrix_core::shutdown::signal())
        .await
        .expect("server failed");

    let _ = shutdown_tx.send(true);
    if let Some(task) = dump_task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "dump task failed");
        }
    }
    tracing::info!("metrix-server stopped");
}
