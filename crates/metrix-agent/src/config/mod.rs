//! Agent config: YAML file (strict parsing) overridden by flags and env.

pub mod args;
pub mod schema;

use std::fs;

use metrix_core::error::{MetricsError, Result};

pub use args::AgentArgs;
pub use schema::AgentConfig;

pub fn load_from_file(path: &str) -> Result<AgentConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MetricsError::Io(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AgentConfig> {
    let cfg: AgentConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
