//! Operational HTTP endpoints.
//!
//! - `/ping` : storage health check (database round trip on the SQL backend)

use axum::{extract::State, http::StatusCode};

use crate::app_state::AppState;
use crate::error::Result;

pub async fn ping(State(state): State<AppState>) -> Result<StatusCode> {
    state.store().ping().await?;
    Ok(StatusCode::OK)
}
