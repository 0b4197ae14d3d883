//! Request middleware.
//!
//! - `log_requests`: one `info` line per request (uri, method, duration,
//!   status, response size).
//! - `envelope`: inflates gzip request bodies, checks `HashSHA256` when a
//!   key is configured, then signs and gzips responses on the way out.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use metrix_core::protocol::envelope;

use crate::app_state::AppState;
use crate::error::{HttpError, Result};

/// Upper bound for request bodies, before and after decompression.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

const SIGNATURE: HeaderName = HeaderName::from_static("hashsha256");

fn header_contains(headers: &HeaderMap, name: HeaderName, needle: &str) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains(needle))
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let uri = req.uri().clone();
    let method = req.method().clone();

    let res = next.run(req).await;
    let (parts, body) = res.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(%uri, %method, error = %e, "failed to read response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        %uri,
        %method,
        duration_us = start.elapsed().as_micros() as u64,
        status = parts.status.as_u16(),
        size = bytes.len(),
        "request"
    );
    Response::from_parts(parts, Body::from(bytes))
}

pub async fn envelope(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match envelope_inner(state, req, next).await {
        Ok(res) => res,
        Err(e) => e.into_response(),
    }
}

async fn envelope_inner(state: AppState, req: Request, next: Next) -> Result<Response> {
    let accepts_gzip = header_contains(req.headers(), header::ACCEPT_ENCODING, "gzip");

    let (mut parts, body) = req.into_parts();
    let mut bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| HttpError::bad_request(format!("read body failed: {e}")))?;

    if header_contains(&parts.headers, header::CONTENT_ENCODING, "gzip") {
        bytes = Bytes::from(envelope::decompress(&bytes, MAX_BODY_BYTES)?);
        parts.headers.remove(header::CONTENT_ENCODING);
        parts.headers.remove(header::CONTENT_LENGTH);
    }

    if let (Some(key), Some(sig)) = (state.sign_key(), parts.headers.get(&SIGNATURE)) {
        let sig = sig
            .to_str()
            .map_err(|_| HttpError::bad_request("invalid HashSHA256 header"))?;
        if !envelope::verify(key, &bytes, sig)? {
            tracing::warn!(uri = %parts.uri, "request signature mismatch");
            return Err(HttpError::bad_request("HashSHA256 mismatch"));
        }
    }

    let res = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let key = state.sign_key();
    if key.is_none() && !accepts_gzip {
        return Ok(res);
    }

    let (mut parts, body) = res.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("read response failed: {e}"))
    })?;
    if bytes.is_empty() {
        return Ok(Response::from_parts(parts, Body::empty()));
    }

    if let Some(key) = key {
        let sig = HeaderValue::from_str(&envelope::sign(key, &bytes)?).map_err(|e| {
            HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("signature header: {e}"))
        })?;
        parts.headers.insert(SIGNATURE, sig);
    }

    if !accepts_gzip {
        return Ok(Response::from_parts(parts, Body::from(bytes)));
    }
    let packed = envelope::compress(&bytes)?;
    parts.headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(Response::from_parts(parts, Body::from(packed)))
}
