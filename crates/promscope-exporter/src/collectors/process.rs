//! Static process gauges: build info and start time.

use std::time::{SystemTime, UNIX_EPOCH};

use promscope_core::error::Result;
use promscope_core::{Gauge, Opts, StaticCollector};

pub fn process_collector() -> Result<StaticCollector> {
    let build_info = Gauge::new(
        Opts::new("promscope_build_info", "Build information; value is always 1.")
            .const_label("version", env!("CARGO_PKG_VERSION")),
    )?;
    build_info.set(1.0);

    let start_time = Gauge::new(Opts::new(
        "promscope_start_time_seconds",
        "Start time of the exporter since unix epoch in seconds.",
    ))?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    start_time.set(now);

    Ok(StaticCollector::new("process")
        .with(build_info)
        .with(start_time))
}
