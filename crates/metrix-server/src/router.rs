//! Axum router wiring.
//!
//! The JSON API and the dashboard sit behind the gzip/signature envelope;
//! `/ping` and the deprecated path endpoints do not. Every route is logged.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(transport::http::index))
        .route("/value/", post(transport::http::value))
        .route("/update/", post(transport::http::update))
        .route("/updates/", post(transport::http::update_batch))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            transport::middleware::envelope,
        ));

    Router::new()
        .route("/ping", get(ops::ping))
        .route("/value/:kind/:name", get(transport::legacy::value))
        .route("/update/:kind/:name/:value", post(transport::legacy::update))
        .merge(api)
        .layer(middleware::from_fn(transport::middleware::log_requests))
        .with_state(state)
}
