//! Shared error type across metrix crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Unknown metric name or kind.
    NotFound,
    /// Backing storage cannot be reached.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core, server, and agent.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("incorrect name")]
    InvalidName,
    #[error("incorrect metric value: {0}")]
    InvalidValue(String),
    #[error("unknown metric type: {0}")]
    UnknownMetricType(String),
    #[error("missing {field} for {kind} metric")]
    MissingValue {
        kind: &'static str,
        field: &'static str,
    },
    #[error("unique constraint race: {0}")]
    UniqueConstraintRace(String),
    #[error("write conflict: {0}")]
    WriteConflict(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("io failure: {0}")]
    Io(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MetricsError::InvalidName
            | MetricsError::InvalidValue(_)
            | MetricsError::MissingValue { .. }
            | MetricsError::UniqueConstraintRace(_)
            | MetricsError::WriteConflict(_)
            | MetricsError::BadRequest(_) => ClientCode::BadRequest,
            MetricsError::UnknownMetricType(_) | MetricsError::NotFound => ClientCode::NotFound,
            MetricsError::StorageUnavailable(_) => ClientCode::Unavailable,
            MetricsError::Io(_) | MetricsError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Only concurrent-writer conflicts are worth another attempt on the
    /// update path.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MetricsError::UniqueConstraintRace(_) | MetricsError::WriteConflict(_)
        )
    }
}

impl From<std::io::Error> for MetricsError {
    fn from(e: std::io::Error) -> Self {
        MetricsError::Io(e.to_string())
    }
}
