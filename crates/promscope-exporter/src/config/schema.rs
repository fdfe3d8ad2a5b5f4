use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;
use promscope_core::error::{PromscopeError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub exporter: ExporterSection,

    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromscopeError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.exporter.validate()?;

        let mut zones = HashSet::new();
        for c in &self.clusters {
            c.validate()?;
            if !zones.insert(c.zone.as_str()) {
                return Err(PromscopeError::Config(format!(
                    "clusters: duplicate zone {:?}",
                    c.zone
                )));
            }
        }
        Ok(())
    }
}

/// What `/metrics` does when some collectors failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Log the errors and serve whatever was gathered.
    #[default]
    Continue,
    /// Answer 500 with the error list.
    HttpError,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    #[serde(default)]
    pub error_handling: ErrorHandling,

    /// Use pedantic registries (instrumentation checks, meant for tests/CI).
    #[serde(default)]
    pub pedantic: bool,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
            error_handling: ErrorHandling::default(),
            pedantic: false,
        }
    }
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.metrics_path.starts_with('/') || self.metrics_path.len() < 2 {
            return Err(PromscopeError::Config(
                "exporter.metrics_path must start with '/' and not be the root".into(),
            ));
        }
        if self.metrics_path == "/healthz" {
            return Err(PromscopeError::Config(
                "exporter.metrics_path collides with /healthz".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            PromscopeError::Config(format!("exporter.listen {:?} is not a socket address: {e}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9100".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}

/// One cluster manager: a zone and the report file assessed on each scrape.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub zone: String,
    pub reports: String,
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.zone.trim().is_empty() {
            return Err(PromscopeError::Config("clusters[].zone must not be empty".into()));
        }
        if self.reports.trim().is_empty() {
            return Err(PromscopeError::Config(format!(
                "clusters[{}].reports must not be empty",
                self.zone
            )));
        }
        Ok(())
    }
}
