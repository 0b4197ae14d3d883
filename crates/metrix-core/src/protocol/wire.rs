//! Transport record (JSON).
//!
//! `type` is kept as a raw string so an unknown kind is reported as
//! `UnknownMetricType` rather than a generic decode failure.

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::metric::{MetricKind, MetricValue};

/// One metric on the wire. Fields outside the four below are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Metric name.
    pub id: String,
    /// Metric kind (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub mtype: String,
    /// Counter delta, present only for counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    /// Gauge value, present only for gauges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl WireRecord {
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            mtype: MetricKind::Gauge.as_str().to_string(),
            delta: None,
            value: Some(value),
        }
    }

    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            mtype: MetricKind::Counter.as_str().to_string(),
            delta: Some(delta),
            value: None,
        }
    }

    /// Lookup request (`POST /value/`): no payload field.
    pub fn query(id: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            id: id.into(),
            mtype: kind.as_str().to_string(),
            delta: None,
            value: None,
        }
    }

    pub fn kind(&self) -> Result<MetricKind> {
        self.mtype.parse()
    }

    /// Validate the record and return its kind with the payload rendered as
    /// the raw text the store update path expects.
    pub fn raw_update(&self) -> Result<(MetricKind, String)> {
        let kind = self.kind()?;
        let raw = match kind {
            MetricKind::Counter => self
                .delta
                .map(|d| d.to_string())
                .ok_or(MetricsError::MissingValue { kind: "counter", field: "delta" })?,
            MetricKind::Gauge => self
                .value
                .map(|v| v.to_string())
                .ok_or(MetricsError::MissingValue { kind: "gauge", field: "value" })?,
        };
        Ok((kind, raw))
    }

    /// Replace the payload with `value`, clearing the other field.
    pub fn with_value(mut self, value: MetricValue) -> Self {
        self.mtype = value.kind().as_str().to_string();
        match value {
            MetricValue::Gauge(v) => {
                self.value = Some(v);
                self.delta = None;
            }
            MetricValue::Counter(d) => {
                self.delta = Some(d);
                self.value = None;
            }
        }
        self
    }
}
