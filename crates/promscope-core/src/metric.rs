//! Metric points: counters, gauges and collected samples.
//!
//! Values are `f64` stored as bit patterns in an `AtomicU64`; every update is
//! a compare-and-swap loop so concurrent writers never lose an increment and
//! readers never observe a torn value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::desc::{Desc, Opts};
use crate::error::{PromscopeError, Result};

/// Sample kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

#[derive(Debug, Default)]
struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    fn set(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Release);
    }

    fn add(&self, delta: f64) {
        let mut cur = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(cur) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(cur, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => cur = actual,
            }
        }
    }
}

/// One addressable time series: a descriptor bound to label values.
#[derive(Debug)]
struct Point {
    desc: Arc<Desc>,
    label_values: Vec<String>,
    value: AtomicF64,
}

impl Point {
    fn new(desc: Arc<Desc>, label_values: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            desc,
            label_values,
            value: AtomicF64::default(),
        })
    }
}

/// Common surface of point handles stored in a [`crate::vec::MetricVec`].
pub trait Metric: Clone + Send + Sync + 'static {
    const KIND: MetricKind;

    /// Create a zero-valued point. Arity was checked by the caller.
    fn with_point(desc: Arc<Desc>, label_values: Vec<String>) -> Self;

    fn desc(&self) -> &Arc<Desc>;

    fn label_values(&self) -> &[String];

    fn get(&self) -> f64;

    /// Snapshot this point as a sample.
    fn sample(&self) -> Sample {
        Sample {
            desc: Arc::clone(self.desc()),
            label_values: self.label_values().to_vec(),
            kind: Self::KIND,
            value: self.get(),
        }
    }

    /// True when both handles refer to the same underlying point.
    fn same_point(&self, other: &Self) -> bool;
}

/// Monotonic counter handle. Clones share the same point.
#[derive(Debug, Clone)]
pub struct Counter {
    point: Arc<Point>,
}

impl Counter {
    /// Label-free counter.
    pub fn new(opts: Opts) -> Result<Self> {
        let desc = opts.describe(&[])?;
        Ok(Self::with_point(Arc::new(desc), Vec::new()))
    }

    /// Label-free counter from an existing descriptor.
    pub fn from_desc(desc: Arc<Desc>) -> Result<Self> {
        if !desc.variable_labels().is_empty() {
            return Err(PromscopeError::UnexpectedLabels(desc.name().to_string()));
        }
        Ok(Self::with_point(desc, Vec::new()))
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.point.value.add(1.0);
    }

    /// Increment by `delta`; negative (or NaN) deltas are rejected.
    pub fn add(&self, delta: f64) -> Result<()> {
        if delta.is_nan() || delta < 0.0 {
            return Err(PromscopeError::NegativeDelta(delta));
        }
        self.point.value.add(delta);
        Ok(())
    }
}

impl Metric for Counter {
    const KIND: MetricKind = MetricKind::Counter;

    fn with_point(desc: Arc<Desc>, label_values: Vec<String>) -> Self {
        Self {
            point: Point::new(desc, label_values),
        }
    }

    fn desc(&self) -> &Arc<Desc> {
        &self.point.desc
    }

    fn label_values(&self) -> &[String] {
        &self.point.label_values
    }

    fn get(&self) -> f64 {
        self.point.value.get()
    }

    fn same_point(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.point, &other.point)
    }
}

/// Gauge handle; the value may move in either direction.
#[derive(Debug, Clone)]
pub struct Gauge {
    point: Arc<Point>,
}

impl Gauge {
    /// Label-free gauge.
    pub fn new(opts: Opts) -> Result<Self> {
        let desc = opts.describe(&[])?;
        Ok(Self::with_point(Arc::new(desc), Vec::new()))
    }

    /// Label-free gauge from an existing descriptor.
    pub fn from_desc(desc: Arc<Desc>) -> Result<Self> {
        if !desc.variable_labels().is_empty() {
            return Err(PromscopeError::UnexpectedLabels(desc.name().to_string()));
        }
        Ok(Self::with_point(desc, Vec::new()))
    }

    pub fn set(&self, v: f64) {
        self.point.value.set(v);
    }

    pub fn inc(&self) {
        self.add(1.0);
    }

    pub fn dec(&self) {
        self.add(-1.0);
    }

    pub fn add(&self, delta: f64) {
        self.point.value.add(delta);
    }

    pub fn sub(&self, delta: f64) {
        self.point.value.add(-delta);
    }
}

impl Metric for Gauge {
    const KIND: MetricKind = MetricKind::Gauge;

    fn with_point(desc: Arc<Desc>, label_values: Vec<String>) -> Self {
        Self {
            point: Point::new(desc, label_values),
        }
    }

    fn desc(&self) -> &Arc<Desc> {
        &self.point.desc
    }

    fn label_values(&self) -> &[String] {
        &self.point.label_values
    }

    fn get(&self) -> f64 {
        self.point.value.get()
    }

    fn same_point(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.point, &other.point)
    }
}

/// One collected value, the unit a collector yields.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub desc: Arc<Desc>,
    pub label_values: Vec<String>,
    pub kind: MetricKind,
    pub value: f64,
}

impl Sample {
    /// Build a sample that is not backed by a stored point.
    pub fn new_const(
        desc: Arc<Desc>,
        kind: MetricKind,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self> {
        desc.check_arity(label_values.len())?;
        Ok(Self {
            desc,
            label_values,
            kind,
            value,
        })
    }

    /// Const labels and variable labels merged, sorted by name.
    pub fn label_pairs(&self) -> Vec<(String, String)> {
        self.desc.label_pairs(&self.label_values)
    }
}
