//! HTTP mapping for `MetricsError` (plain-text bodies).

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use metrix_core::error::{ClientCode, MetricsError};

pub type Result<T> = std::result::Result<T, HttpError>;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    /// Update path: unknown kind is 404, every other failure is 400 with the
    /// underlying message.
    pub fn update(e: MetricsError) -> Self {
        match e {
            MetricsError::UnknownMetricType(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            other => Self::bad_request(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<MetricsError> for HttpError {
    fn from(e: MetricsError) -> Self {
        let status = match e.client_code() {
            ClientCode::BadRequest => StatusCode::BAD_REQUEST,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::Unavailable | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self.message),
        )
            .into_response()
    }
}
