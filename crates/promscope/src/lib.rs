//! Top-level facade crate for promscope.
//!
//! Re-exports the core registry types and the exporter library so users can depend on a single crate.

pub mod core {
    pub use promscope_core::*;
}

pub mod exporter {
    pub use promscope_exporter::*;
}
