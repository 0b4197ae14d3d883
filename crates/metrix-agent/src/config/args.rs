//! Command-line flags, each backed by an environment variable.

use clap::Parser;

use metrix_core::error::Result;

use super::{load_from_file, AgentConfig};

#[derive(Debug, Default, Parser)]
#[command(name = "metrix-agent", about = "Runtime metrics reporting agent")]
pub struct AgentArgs {
    /// YAML config file.
    #[arg(short = 'c', long, env = "CONFIG")]
    pub config: Option<String>,

    /// Server address (host:port).
    #[arg(short = 'a', long, env = "ADDRESS")]
    pub address: Option<String>,

    /// Seconds between samples.
    #[arg(short = 'p', long, env = "POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Seconds between reports.
    #[arg(short = 'r', long, env = "REPORT_INTERVAL")]
    pub report_interval: Option<u64>,

    /// HMAC key for the HashSHA256 header.
    #[arg(short = 'k', long, env = "KEY")]
    pub key: Option<String>,
}

impl AgentArgs {
    pub fn into_config(self) -> Result<AgentConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_from_file(path)?,
            None => AgentConfig::default(),
        };

        if let Some(v) = self.address {
            cfg.address = v;
        }
        if let Some(v) = self.poll_interval {
            cfg.poll_interval = v;
        }
        if let Some(v) = self.report_interval {
            cfg.report_interval = v;
        }
        if let Some(v) = self.key {
            cfg.key = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
