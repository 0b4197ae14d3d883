//! JSON API handlers.
//!
//! Bodies arrive as raw bytes (already inflated by the envelope middleware)
//! and are decoded here so malformed JSON is always a 400.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use metrix_core::protocol::WireRecord;
use metrix_core::MetricKind;

use crate::app_state::AppState;
use crate::error::{HttpError, Result};
use crate::transport::page;

fn decode_json<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| HttpError::bad_request(format!("Unable to decode json: {e}")))
}

/// `GET /`: HTML table of every metric.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let store = state.store();
    let counters = store.get(MetricKind::Counter.as_str()).await?.unwrap_or_default();
    let gauges = store.get(MetricKind::Gauge.as_str()).await?.unwrap_or_default();
    Ok(Html(page::render(&counters, &gauges)))
}

/// `POST /value/`: `{id, type}` in, full record out.
pub async fn value(State(state): State<AppState>, body: Bytes) -> Result<Json<WireRecord>> {
    let req: WireRecord = decode_json(&body)?;
    let kind = req
        .kind()
        .map_err(|_| HttpError::new(StatusCode::NOT_FOUND, "incorrect metric type"))?;

    let metrics = state
        .store()
        .get(kind.as_str())
        .await?
        .ok_or_else(HttpError::not_found)?;
    let raw = metrics.get(&req.id).ok_or_else(HttpError::not_found)?;

    let v = kind
        .parse_value(raw)
        .map_err(|e| HttpError::bad_request(format!("Can't parse data: {e}")))?;
    Ok(Json(req.with_value(v)))
}

/// `POST /update/`: apply one record and echo it with the stored value.
pub async fn update(State(state): State<AppState>, body: Bytes) -> Result<Json<WireRecord>> {
    let req: WireRecord = decode_json(&body)?;
    let (kind, raw) = req.raw_update().map_err(HttpError::update)?;

    let store = state.store();
    let outcome = state
        .retry()
        .run_update("update metric", || store.update_one(kind.as_str(), &req.id, &raw))
        .await;
    if let Err(ex) = outcome.retry {
        return Err(HttpError::bad_request(format!("incorrect metric value: {ex}")));
    }
    let v = outcome.result.map_err(HttpError::update)?;

    state.after_update().await;
    Ok(Json(req.with_value(v)))
}

/// `POST /updates/`: apply a batch; empty 200 on success.
pub async fn update_batch(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let records: Vec<WireRecord> = decode_json(&body)?;

    let store = state.store();
    let outcome = state
        .retry()
        .run_update("update metrics", || store.update_batch(&records))
        .await;
    if let Err(ex) = outcome.retry {
        return Err(HttpError::bad_request(format!("Unable to update batch: {ex}")));
    }
    outcome
        .result
        .map_err(|e| HttpError::bad_request(format!("Unable to update batch: {e}")))?;

    state.after_update().await;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")]).into_response())
}
