//! Deprecated path-parameter endpoints (plain text in and out).
//!
//! - `GET /value/{kind}/{name}`
//! - `POST /update/{kind}/{name}/{value}`

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use metrix_core::MetricKind;

use crate::app_state::AppState;
use crate::error::{HttpError, Result};

pub async fn value(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<Response> {
    let kind: MetricKind = kind
        .to_lowercase()
        .parse()
        .map_err(|_| HttpError::new(StatusCode::NOT_FOUND, "incorrect metric type"))?;

    let metrics = state
        .store()
        .get(kind.as_str())
        .await?
        .ok_or_else(HttpError::not_found)?;
    let v = metrics.get(&name).ok_or_else(HttpError::not_found)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        v.clone(),
    )
        .into_response())
}

pub async fn update(
    State(state): State<AppState>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<StatusCode> {
    let kind: MetricKind = kind
        .to_lowercase()
        .parse()
        .map_err(|_| HttpError::bad_request("incorrect metric type"))?;

    state
        .store()
        .update_one(kind.as_str(), &name, &value)
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    state.after_update().await;
    Ok(StatusCode::OK)
}
