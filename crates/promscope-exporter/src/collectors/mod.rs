//! Collectors shipped with the exporter.
//!
//! - `cluster`: computed collector assessing per-host report files
//! - `scrape`: self-instrumentation of the `/metrics` endpoint
//! - `process`: static build/start-time gauges

pub mod cluster;
pub mod process;
pub mod scrape;

pub use cluster::{cluster_manager, load_reports, HostReport, HostReports};
pub use process::process_collector;
pub use scrape::ScrapeStats;
