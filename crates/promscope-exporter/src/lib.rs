//! promscope exporter library entry.
//!
//! Wires config, registries, the shipped collectors and the HTTP endpoints
//! into one exporter. Consumed by the binary (`main.rs`) and by integration
//! tests.

pub mod app_state;
pub mod collectors;
pub mod config;
pub mod ops;
pub mod router;
