use std::time::Duration;

use serde::Deserialize;
use metrix_core::error::{MetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Server address (host:port).
    #[serde(default = "default_address")]
    pub address: String,

    /// Shared secret for `HashSHA256`. Empty disables signing.
    #[serde(default)]
    pub key: String,

    /// Seconds between samples.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Seconds between reports.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            key: String::new(),
            poll_interval: default_poll_interval(),
            report_interval: default_report_interval(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(MetricsError::BadRequest("address must not be empty".into()));
        }
        if !self.address.contains(':') {
            return Err(MetricsError::BadRequest(
                "address must be in host:port form".into(),
            ));
        }
        if self.poll_interval == 0 {
            return Err(MetricsError::BadRequest("poll_interval must be > 0".into()));
        }
        if self.report_interval == 0 {
            return Err(MetricsError::BadRequest("report_interval must be > 0".into()));
        }
        Ok(())
    }

    pub fn poll(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn report(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    pub fn sign_key(&self) -> Option<&[u8]> {
        if self.key.is_empty() {
            None
        } else {
            Some(self.key.as_bytes())
        }
    }

    /// Batch endpoint on the configured server.
    pub fn endpoint(&self) -> String {
        format!("http://{}/updates/", self.address)
    }
}

fn default_address() -> String {
    "localhost:8080".into()
}
fn default_poll_interval() -> u64 {
    2
}
fn default_report_interval() -> u64 {
    10
}
