use std::time::Duration;

use serde::Deserialize;
use metrix_core::error::{MetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,

    /// Shared secret for `HashSHA256`. Empty disables signing.
    #[serde(default)]
    pub key: String,

    /// SQLite URL. Empty selects the in-memory store.
    #[serde(default)]
    pub database_dsn: String,

    #[serde(default)]
    pub dump: DumpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            key: String::new(),
            database_dsn: String::new(),
            dump: DumpConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(MetricsError::BadRequest("address must not be empty".into()));
        }
        if !self.address.contains(':') {
            return Err(MetricsError::BadRequest(
                "address must be in host:port form".into(),
            ));
        }

        self.dump.validate()?;

        Ok(())
    }

    pub fn sign_key(&self) -> Option<&[u8]> {
        if self.key.is_empty() {
            None
        } else {
            Some(self.key.as_bytes())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    /// Seconds between dumps; 0 dumps after every update.
    #[serde(default = "default_store_interval")]
    pub store_interval: u64,

    /// Dump file. Empty disables dumping and restoring.
    #[serde(default = "default_file_storage_path")]
    pub file_storage_path: String,

    #[serde(default = "default_restore")]
    pub restore: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            store_interval: default_store_interval(),
            file_storage_path: default_file_storage_path(),
            restore: default_restore(),
        }
    }
}

impl DumpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.store_interval > 86_400 {
            return Err(MetricsError::BadRequest(
                "dump.store_interval must be at most 86400 seconds".into(),
            ));
        }
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        !self.file_storage_path.is_empty()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.store_interval)
    }
}

fn default_address() -> String {
    "localhost:8080".into()
}
fn default_store_interval() -> u64 {
    300
}
fn default_file_storage_path() -> String {
    "/tmp/metrics-db.json".into()
}
fn default_restore() -> bool {
    true
}
