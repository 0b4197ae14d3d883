//! Batch upload to `POST /updates/`.
//!
//! The JSON array is signed before compression (the signature covers the
//! plain body), then gzipped. Uploads run under the retry policy: transport
//! failures and 5xx responses are retried, 4xx responses are final.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use thiserror::Error;

use metrix_core::error::MetricsError;
use metrix_core::protocol::{envelope, WireRecord};
use metrix_core::retry::RetryPolicy;

use crate::config::AgentConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("encode failed: {0}")]
    Encode(#[from] MetricsError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },
}

impl ReportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::Encode(_) => false,
            ReportError::Transport(_) => true,
            ReportError::Status { status, .. } => *status >= 500,
        }
    }
}

pub struct Reporter {
    client: reqwest::Client,
    endpoint: String,
    key: Option<Vec<u8>>,
    retry: RetryPolicy,
}

/// Request body ready to send.
#[derive(Debug, Clone)]
pub struct Payload {
    pub body: Bytes,
    pub signature: Option<String>,
}

impl Reporter {
    pub fn new(cfg: &AgentConfig, retry: RetryPolicy) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint(),
            key: cfg.sign_key().map(<[u8]>::to_vec),
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn encode(&self, records: &[WireRecord]) -> Result<Payload, ReportError> {
        let plain = serde_json::to_vec(records)
            .map_err(|e| MetricsError::Internal(format!("encode batch: {e}")))?;
        let signature = match &self.key {
            Some(key) => Some(envelope::sign(key, &plain)?),
            None => None,
        };
        let body = Bytes::from(envelope::compress(&plain)?);
        Ok(Payload { body, signature })
    }

    /// Deliver one batch. An empty batch is a no-op.
    pub async fn send(&self, records: &[WireRecord]) -> Result<(), ReportError> {
        if records.is_empty() {
            return Ok(());
        }
        let payload = self.encode(records)?;

        let outcome = self
            .retry
            .run("report metrics", || self.post(&payload), ReportError::is_retryable)
            .await;
        if let Err(ex) = &outcome.retry {
            tracing::error!(endpoint = %self.endpoint, error = %ex, "report retries exhausted");
        }
        outcome.result?;

        tracing::debug!(endpoint = %self.endpoint, records = records.len(), "report delivered");
        Ok(())
    }

    async fn post(&self, payload: &Payload) -> Result<(), ReportError> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_ENCODING, "gzip")
            .body(payload.body.clone());
        if let Some(sig) = &payload.signature {
            req = req.header(envelope::SIGNATURE_HEADER, sig);
        }

        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(ReportError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}
