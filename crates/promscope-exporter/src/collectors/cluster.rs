//! Cluster manager collector.
//!
//! Every collect re-reads the zone's report file and turns it into two
//! families keyed by host: OOM crash count (counter) and RAM usage (gauge).
//! The read happens on the scrape path; a missing or malformed file fails
//! this collector only.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use promscope_core::error::{PromscopeError, Result};
use promscope_core::{ComputedCollector, MetricKind, Opts, Readings};

pub const OOM_CRASHES: &str = "clustermanager_oom_crashes_total";
pub const RAM_USAGE: &str = "clustermanager_ram_usage_bytes";

/// Report file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostReports {
    #[serde(default)]
    pub hosts: BTreeMap<String, HostReport>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostReport {
    pub oom_crashes: u64,
    pub ram_usage_bytes: f64,
}

pub fn load_reports(path: &Path) -> Result<HostReports> {
    let s = fs::read_to_string(path)
        .map_err(|e| PromscopeError::Assessment(format!("read {} failed: {e}", path.display())))?;
    serde_yaml::from_str(&s)
        .map_err(|e| PromscopeError::Assessment(format!("invalid report {}: {e}", path.display())))
}

/// Build the computed collector for one zone.
pub fn cluster_manager(zone: &str, reports: impl Into<PathBuf>) -> Result<ComputedCollector> {
    let oom = Opts::new(OOM_CRASHES, "Number of OOM crashes.")
        .const_label("zone", zone)
        .describe(&["host"])?;
    let ram = Opts::new(RAM_USAGE, "RAM usage as reported to the cluster manager.")
        .const_label("zone", zone)
        .describe(&["host"])?;

    let path: PathBuf = reports.into();
    let zone_name = zone.to_string();
    ComputedCollector::new(
        format!("clustermanager/{zone}"),
        vec![(oom, MetricKind::Counter), (ram, MetricKind::Gauge)],
        move || {
            let reports = load_reports(&path)?;
            debug!(zone = %zone_name, hosts = reports.hosts.len(), "cluster reports assessed");

            let mut oom_by_host = Readings::new();
            let mut ram_by_host = Readings::new();
            for (host, r) in reports.hosts {
                oom_by_host.insert(host.clone(), r.oom_crashes as f64);
                ram_by_host.insert(host, r.ram_usage_bytes);
            }
            Ok(vec![oom_by_host, ram_by_host])
        },
    )
}
