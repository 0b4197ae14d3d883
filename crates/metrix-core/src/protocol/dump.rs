//! Dump file record: every value stored as its canonical string, whatever the
//! kind.

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::metric::MetricValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpRecord {
    #[serde(rename = "type")]
    pub mtype: String,
    pub name: String,
    pub value: String,
}

impl DumpRecord {
    pub fn new(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            mtype: value.kind().as_str().to_string(),
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// Serialize records as an indented JSON array.
pub fn encode(records: &[DumpRecord]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(records)
        .map_err(|e| MetricsError::Internal(format!("encode dump failed: {e}")))
}

pub fn decode(bytes: &[u8]) -> Result<Vec<DumpRecord>> {
    serde_json::from_slice(bytes).map_err(|e| MetricsError::Io(format!("invalid dump: {e}")))
}
