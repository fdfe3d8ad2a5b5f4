//! Prometheus text exposition format (0.0.4), counters and gauges only.

use std::fmt::Write;

use bytes::Bytes;

use crate::error::{PromscopeError, Result};
use crate::family::MetricFamily;

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

/// Render families in order. A family without series is rejected rather
/// than written as a dangling header.
pub fn encode(families: &[MetricFamily]) -> Result<Bytes> {
    let mut out = String::new();
    for f in families {
        render_family(f, &mut out)?;
    }
    Ok(Bytes::from(out))
}

fn render_family(f: &MetricFamily, out: &mut String) -> Result<()> {
    if f.metrics.is_empty() {
        return Err(PromscopeError::Encode(format!(
            "family {:?} has no metrics",
            f.name
        )));
    }

    let w = |e: std::fmt::Error| PromscopeError::Encode(e.to_string());
    if !f.help.is_empty() {
        writeln!(out, "# HELP {} {}", f.name, escape_help(&f.help)).map_err(w)?;
    }
    writeln!(out, "# TYPE {} {}", f.name, f.kind.as_str()).map_err(w)?;

    for s in &f.metrics {
        if s.labels.is_empty() {
            writeln!(out, "{} {}", f.name, format_value(s.value)).map_err(w)?;
            continue;
        }
        let label_str = s
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}{{{}}} {}", f.name, label_str, format_value(s.value)).map_err(w)?;
    }
    Ok(())
}
