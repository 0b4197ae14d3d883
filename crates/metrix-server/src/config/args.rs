//! Command-line flags. Each flag can also come from its environment variable;
//! a flag given on the command line wins over the environment, and either
//! wins over the config file.

use clap::Parser;

use metrix_core::error::Result;

use super::{load_from_file, ServerConfig};

#[derive(Debug, Default, Parser)]
#[command(name = "metrix-server", about = "Metrics collector server")]
pub struct ServerArgs {
    /// YAML config file.
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<String>,

    /// Listen address (host:port).
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// Seconds between dumps; 0 dumps after every update.
    #[arg(short = 'i', long, env = "STORE_INTERVAL")]
    pub store_interval: Option<u64>,

    /// Dump file path; empty disables dumping.
    #[arg(short = 'f', long, env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// Restore metrics from the dump file on start.
    #[arg(short = 'r', long, env = "RESTORE")]
    pub restore: Option<bool>,

    /// Database URL (sqlite:...).
    #[arg(short = 'd', long, env = "DATABASE_DSN")]
    pub database_dsn: Option<String>,

    /// HMAC key for the HashSHA256 header.
    #[arg(short = 'k', long, env = "KEY")]
    pub key: Option<String>,
}

impl ServerArgs {
    /// Build the final config: file (or defaults), then overrides, then validate.
    pub fn into_config(self) -> Result<ServerConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(v) = self.address {
            cfg.address = v;
        }
        if let Some(v) = self.store_interval {
            cfg.dump.store_interval = v;
        }
        if let Some(v) = self.file_storage_path {
            cfg.dump.file_storage_path = v;
        }
        if let Some(v) = self.restore {
            cfg.dump.restore = v;
        }
        if let Some(v) = self.database_dsn {
            cfg.database_dsn = v;
        }
        if let Some(v) = self.key {
            cfg.key = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
