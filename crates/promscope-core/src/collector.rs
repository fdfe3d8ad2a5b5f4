//! Collector capability and its two built-in variants.
//!
//! A collector advertises the descriptors it owns (`describe`) and yields
//! its current samples on demand (`collect`). Both return finite iterators;
//! calling again starts a fresh pass.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::desc::Desc;
use crate::error::{PromscopeError, Result};
use crate::metric::{Counter, Gauge, Metric, MetricKind, Sample};
use crate::vec::{CounterVec, GaugeVec};

pub type DescIter<'a> = Box<dyn Iterator<Item = Arc<Desc>> + 'a>;
pub type SampleIter<'a> = Box<dyn Iterator<Item = Result<Sample>> + 'a>;

/// Unit producing descriptors and current sample values on demand.
pub trait Collector: Send + Sync {
    /// Label used in logs and error reports.
    fn name(&self) -> &str;

    /// Every descriptor this collector will ever emit.
    fn describe(&self) -> DescIter<'_>;

    /// Current state, computed fresh on each call.
    ///
    /// An `Err` item aborts this collector's contribution to the gather.
    fn collect(&self) -> SampleIter<'_>;
}

/// Stored state owned by a [`StaticCollector`].
#[derive(Clone)]
pub enum Owned {
    Counter(Counter),
    Gauge(Gauge),
    CounterVec(CounterVec),
    GaugeVec(GaugeVec),
}

impl Owned {
    fn desc(&self) -> Arc<Desc> {
        match self {
            Owned::Counter(m) => Arc::clone(m.desc()),
            Owned::Gauge(m) => Arc::clone(m.desc()),
            Owned::CounterVec(v) => Arc::clone(v.desc()),
            Owned::GaugeVec(v) => Arc::clone(v.desc()),
        }
    }

    fn samples(&self) -> std::vec::IntoIter<Sample> {
        match self {
            Owned::Counter(m) => vec![m.sample()].into_iter(),
            Owned::Gauge(m) => vec![m.sample()].into_iter(),
            Owned::CounterVec(v) => v.samples(),
            Owned::GaugeVec(v) => v.samples(),
        }
    }
}

impl From<Counter> for Owned {
    fn from(m: Counter) -> Self {
        Owned::Counter(m)
    }
}

impl From<Gauge> for Owned {
    fn from(m: Gauge) -> Self {
        Owned::Gauge(m)
    }
}

impl From<CounterVec> for Owned {
    fn from(v: CounterVec) -> Self {
        Owned::CounterVec(v)
    }
}

impl From<GaugeVec> for Owned {
    fn from(v: GaugeVec) -> Self {
        Owned::GaugeVec(v)
    }
}

/// Collector that reads its own points and vectors. No side effects.
pub struct StaticCollector {
    name: String,
    owned: Vec<Owned>,
}

impl StaticCollector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owned: Vec::new(),
        }
    }

    /// Add a counter, gauge or vector. Handles are shared, so the caller
    /// keeps updating its own clone.
    pub fn with(mut self, m: impl Into<Owned>) -> Self {
        self.owned.push(m.into());
        self
    }
}

impl Collector for StaticCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> DescIter<'_> {
        Box::new(self.owned.iter().map(Owned::desc))
    }

    fn collect(&self) -> SampleIter<'_> {
        Box::new(self.owned.iter().flat_map(Owned::samples).map(Ok))
    }
}

/// One `entity -> value` map returned by an assessment.
pub type Readings = BTreeMap<String, f64>;

/// Caller-supplied assessment; returns one [`Readings`] per descriptor, in
/// declaration order.
pub type AssessFn = dyn Fn() -> Result<Vec<Readings>> + Send + Sync;

/// Collector that runs an assessment function on every collect.
///
/// Results are never cached. Every descriptor carries exactly one variable
/// label, which receives the entity key.
pub struct ComputedCollector {
    name: String,
    descs: Vec<(Arc<Desc>, MetricKind)>,
    assess: Box<AssessFn>,
}

impl ComputedCollector {
    pub fn new<F>(
        name: impl Into<String>,
        descs: Vec<(Desc, MetricKind)>,
        assess: F,
    ) -> Result<Self>
    where
        F: Fn() -> Result<Vec<Readings>> + Send + Sync + 'static,
    {
        let name = name.into();
        if descs.is_empty() {
            return Err(PromscopeError::NoDescriptors(name));
        }
        for (d, _) in &descs {
            d.check_arity(1)?;
        }
        Ok(Self {
            name,
            descs: descs.into_iter().map(|(d, k)| (Arc::new(d), k)).collect(),
            assess: Box::new(assess),
        })
    }

    fn run(&self) -> Result<Vec<Sample>> {
        let readings = match catch_unwind(AssertUnwindSafe(|| (self.assess)())) {
            Ok(r) => r?,
            Err(_) => {
                return Err(PromscopeError::Assessment(format!(
                    "assessment panicked in {}",
                    self.name
                )))
            }
        };

        if readings.len() != self.descs.len() {
            return Err(PromscopeError::Assessment(format!(
                "expected {} readings, got {}",
                self.descs.len(),
                readings.len()
            )));
        }

        let mut out = Vec::new();
        for ((desc, kind), by_entity) in self.descs.iter().zip(readings) {
            for (entity, value) in by_entity {
                out.push(Sample::new_const(
                    Arc::clone(desc),
                    *kind,
                    value,
                    vec![entity],
                )?);
            }
        }
        Ok(out)
    }
}

impl Collector for ComputedCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> DescIter<'_> {
        Box::new(self.descs.iter().map(|(d, _)| Arc::clone(d)))
    }

    fn collect(&self) -> SampleIter<'_> {
        match self.run() {
            Ok(samples) => Box::new(samples.into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}
