//! Labeled metric vectors backed by `DashMap`.
//!
//! Each distinct label-value tuple maps to exactly one point. The
//! get-or-create path goes through `DashMap::entry`, which holds the shard
//! write lock across the lookup and the insert, so concurrent first accesses
//! to the same tuple observe a single point. Unrelated tuples on other shards
//! never contend.

use std::sync::Arc;

use dashmap::DashMap;

use crate::desc::{Desc, Labels, Opts};
use crate::error::{PromscopeError, Result};
use crate::metric::{Counter, Gauge, Metric, Sample};

struct VecInner<M> {
    desc: Arc<Desc>,
    points: DashMap<Vec<String>, M>,
}

/// Vector of points of kind `M`, keyed by label values. Clones share state.
pub struct MetricVec<M: Metric> {
    inner: Arc<VecInner<M>>,
}

pub type CounterVec = MetricVec<Counter>;
pub type GaugeVec = MetricVec<Gauge>;

impl<M: Metric> Clone for MetricVec<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Metric> MetricVec<M> {
    pub fn new(opts: Opts, label_names: &[&str]) -> Result<Self> {
        let desc = opts.describe(label_names)?;
        Ok(Self::from_desc(Arc::new(desc)))
    }

    pub fn from_desc(desc: Arc<Desc>) -> Self {
        Self {
            inner: Arc::new(VecInner {
                desc,
                points: DashMap::new(),
            }),
        }
    }

    pub fn desc(&self) -> &Arc<Desc> {
        &self.inner.desc
    }

    /// Get or create the point for the given label values (in declaration order).
    pub fn with_label_values(&self, values: &[&str]) -> Result<M> {
        self.inner.desc.check_arity(values.len())?;
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        Ok(self.get_or_create(key))
    }

    /// Get or create the point for a label name -> value map.
    pub fn with(&self, labels: &Labels) -> Result<M> {
        let desc = &self.inner.desc;
        desc.check_arity(labels.len())?;

        let mut key = Vec::with_capacity(labels.len());
        for name in desc.variable_labels() {
            let v = labels.get(name).ok_or_else(|| PromscopeError::LabelMismatch {
                name: desc.name().to_string(),
                label: name.clone(),
            })?;
            key.push(v.clone());
        }
        Ok(self.get_or_create(key))
    }

    fn get_or_create(&self, key: Vec<String>) -> M {
        if let Some(m) = self.inner.points.get(&key) {
            return m.value().clone();
        }
        let desc = Arc::clone(&self.inner.desc);
        self.inner
            .points
            .entry(key.clone())
            .or_insert_with(|| M::with_point(desc, key))
            .value()
            .clone()
    }

    /// Number of distinct label tuples seen so far.
    pub fn len(&self) -> usize {
        self.inner.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.points.is_empty()
    }

    /// Current value of every point, sorted by label tuple.
    ///
    /// Values are read after the shard locks are released, so writers are
    /// only blocked for the duration of the handle copy.
    pub fn samples(&self) -> std::vec::IntoIter<Sample> {
        let mut handles: Vec<M> = self
            .inner
            .points
            .iter()
            .map(|r| r.value().clone())
            .collect();
        handles.sort_by(|a, b| a.label_values().cmp(b.label_values()));
        handles
            .iter()
            .map(Metric::sample)
            .collect::<Vec<_>>()
            .into_iter()
    }
}
