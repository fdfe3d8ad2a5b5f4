//! Shared application state for the exporter.
//!
//! Registries are built here once at startup and threaded to the router;
//! there is no process-global registry.
//! - self registry: process gauges + scrape stats
//! - one registry per cluster zone (same family names, different `zone`
//!   const label), merged at scrape time by `Gatherers`

use std::sync::Arc;

use promscope_core::error::Result;
use promscope_core::{Collector, Gatherers, Registry};

use crate::collectors::{cluster_manager, process_collector, ScrapeStats};
use crate::config::{ErrorHandling, ExporterConfig};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ExporterConfig,
    gatherers: Gatherers,
    scrape: Arc<ScrapeStats>,
}

impl AppState {
    /// Build every registry described by the config.
    /// Registration errors are returned so main can abort startup.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let new_registry = || {
            if cfg.exporter.pedantic {
                Registry::pedantic()
            } else {
                Registry::new()
            }
        };

        let scrape = Arc::new(ScrapeStats::new()?);

        let own = new_registry();
        own.register_all([
            Arc::new(process_collector()?) as Arc<dyn Collector>,
            scrape.clone() as Arc<dyn Collector>,
        ])?;
        let mut gatherers = Gatherers::new().with(Arc::new(own));

        for c in &cfg.clusters {
            let reg = new_registry();
            reg.register(Arc::new(cluster_manager(&c.zone, &c.reports)?))?;
            tracing::info!(zone = %c.zone, reports = %c.reports, "cluster collector registered");
            gatherers.push(Arc::new(reg));
        }

        Ok(Self::from_parts(cfg, gatherers, scrape))
    }

    /// Assemble state from prebuilt parts (custom gatherers, tests).
    pub fn from_parts(cfg: ExporterConfig, gatherers: Gatherers, scrape: Arc<ScrapeStats>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                gatherers,
                scrape,
            }),
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn error_handling(&self) -> ErrorHandling {
        self.inner.cfg.exporter.error_handling
    }

    pub fn gatherers(&self) -> &Gatherers {
        &self.inner.gatherers
    }

    pub fn scrape_stats(&self) -> &ScrapeStats {
        &self.inner.scrape
    }
}
