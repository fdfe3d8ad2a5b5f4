//! promscope core: metric descriptors, points, collectors, the registry and
//! the gatherer merge layer.
//!
//! The crate carries no transport or runtime dependencies; an HTTP layer
//! calls [`Gatherer::gather`] once per scrape and hands the families to
//! [`expose::encode`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Registration and
//! collection failures surface as `PromscopeError` values so the caller
//! decides whether to abort startup or keep serving.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collector;
pub mod desc;
pub mod error;
pub mod expose;
pub mod family;
pub mod gatherer;
pub mod metric;
pub mod registry;
pub mod vec;

pub use collector::{Collector, ComputedCollector, Owned, Readings, StaticCollector};
pub use desc::{Desc, Labels, Opts};
/// Shared result type.
pub use error::{ErrorClass, PromscopeError, Result};
pub use family::{Gathered, MetricFamily, Series};
pub use gatherer::{Gatherer, Gatherers};
pub use metric::{Counter, Gauge, Metric, MetricKind, Sample};
pub use registry::{Registration, Registry};
pub use vec::{CounterVec, GaugeVec, MetricVec};
