//! Metric kinds, typed values, and the merge rules applied on every update.
//!
//! - Gauge: the parsed value replaces whatever was stored.
//! - Counter: the parsed delta is added to the stored value (absent = 0).
//!
//! Raw values arrive as text (URL segments, dump files) so parsing lives here
//! next to the merge rules; both store backends call into this module.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// The two metric kinds. Names are independent per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::Gauge, MetricKind::Counter];

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }

    /// Parse a raw value of this kind without merging it.
    pub fn parse_value(self, raw: &str) -> Result<MetricValue> {
        match self {
            MetricKind::Gauge => parse_gauge(raw).map(MetricValue::Gauge),
            MetricKind::Counter => parse_counter(raw).map(MetricValue::Counter),
        }
    }
}

impl FromStr for MetricKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(MetricsError::UnknownMetricType(other.to_string())),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored metric value. `Display` yields the canonical decimal form shared
/// by both store backends and the dump format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Gauge(f64),
    Counter(i64),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Counter(_) => MetricKind::Counter,
        }
    }

    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            MetricValue::Counter(_) => None,
        }
    }

    pub fn as_counter(&self) -> Option<i64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            MetricValue::Gauge(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Gauge(v) => write!(f, "{v}"),
            MetricValue::Counter(v) => write!(f, "{v}"),
        }
    }
}

/// Parse a gauge value. Non-finite values are rejected because they have no
/// JSON representation.
pub fn parse_gauge(raw: &str) -> Result<f64> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|e| MetricsError::InvalidValue(format!("{raw:?}: {e}")))?;
    if !v.is_finite() {
        return Err(MetricsError::InvalidValue(format!("{raw:?}: not a finite number")));
    }
    Ok(v)
}

/// Parse a counter delta (base-10 signed integer).
pub fn parse_counter(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|e| MetricsError::InvalidValue(format!("{raw:?}: {e}")))
}

/// Add a delta to a stored counter, rejecting overflow.
pub fn accumulate(current: i64, delta: i64) -> Result<i64> {
    current
        .checked_add(delta)
        .ok_or_else(|| MetricsError::InvalidValue(format!("counter overflow: {current} + {delta}")))
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MetricsError::InvalidName);
    }
    Ok(())
}

/// Apply one raw update to the current value of a metric and return the new
/// value. The value is parsed before the name is checked.
pub fn apply(
    current: Option<MetricValue>,
    kind: MetricKind,
    name: &str,
    raw: &str,
) -> Result<MetricValue> {
    let parsed = kind.parse_value(raw)?;
    validate_name(name)?;

    match parsed {
        MetricValue::Gauge(v) => Ok(MetricValue::Gauge(v)),
        MetricValue::Counter(delta) => {
            let prev = current.and_then(|c| c.as_counter()).unwrap_or(0);
            accumulate(prev, delta).map(MetricValue::Counter)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for k in MetricKind::ALL {
            assert_eq!(k.as_str().parse::<MetricKind>().unwrap(), k);
        }
        assert!(matches!(
            "histogram".parse::<MetricKind>(),
            Err(MetricsError::UnknownMetricType(s)) if s == "histogram"
        ));
    }

    #[test]
    fn canonical_strings() {
        assert_eq!(MetricValue::Gauge(2.0).to_string(), "2");
        assert_eq!(MetricValue::Gauge(0.25).to_string(), "0.25");
        assert_eq!(MetricValue::Counter(-11).to_string(), "-11");
    }

    #[test]
    fn gauge_rejects_non_finite() {
        assert!(matches!(parse_gauge("NaN"), Err(MetricsError::InvalidValue(_))));
        assert!(matches!(parse_gauge("inf"), Err(MetricsError::InvalidValue(_))));
    }

    #[test]
    fn counter_overflow_is_invalid_value() {
        assert!(matches!(accumulate(i64::MAX, 1), Err(MetricsError::InvalidValue(_))));
    }
}
