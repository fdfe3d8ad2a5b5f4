//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;

use promscope_core::error::{PromscopeError, Result};

pub use schema::{ClusterConfig, ErrorHandling, ExporterConfig, ExporterSection};

/// Environment variable overriding the config path.
pub const CONFIG_ENV: &str = "PROMSCOPE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "promscope.yaml";

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PromscopeError::Config(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| PromscopeError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// `$PROMSCOPE_CONFIG` or `promscope.yaml`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
