//! Snapshot types produced by a gather.

use std::collections::{BTreeMap, HashSet};

use serde::{Serialize, Serializer};

use crate::error::{PromscopeError, Result};
use crate::metric::{MetricKind, Sample};

/// One time series inside a family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Const + variable labels, sorted by name.
    pub labels: Vec<(String, String)>,
    /// JSON has no NaN or infinities; those go out as `"NaN"`, `"+Inf"`,
    /// `"-Inf"`, the same tokens the text format uses.
    #[serde(serialize_with = "serialize_value")]
    pub value: f64,
}

fn serialize_value<S: Serializer>(v: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
    if v.is_nan() {
        s.serialize_str("NaN")
    } else if *v == f64::INFINITY {
        s.serialize_str("+Inf")
    } else if *v == f64::NEG_INFINITY {
        s.serialize_str("-Inf")
    } else {
        s.serialize_f64(*v)
    }
}

/// All samples sharing one metric name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Sorted label names shared by every series.
    pub label_names: Vec<String>,
    pub metrics: Vec<Series>,
}

impl MetricFamily {
    /// Describe why `other` cannot be merged into this family, if it cannot.
    pub fn schema_conflict(&self, other: &MetricFamily) -> Option<String> {
        if self.kind != other.kind {
            return Some(format!(
                "type {} vs {}",
                self.kind.as_str(),
                other.kind.as_str()
            ));
        }
        if self.help != other.help {
            return Some(format!("help {:?} vs {:?}", self.help, other.help));
        }
        if self.label_names != other.label_names {
            return Some(format!(
                "labels [{}] vs [{}]",
                self.label_names.join(","),
                other.label_names.join(",")
            ));
        }
        None
    }

    /// Series lookup by label value tuple (in label name order).
    pub fn value_of(&self, label_values: &[&str]) -> Option<f64> {
        self.metrics
            .iter()
            .find(|s| {
                s.labels.len() == label_values.len()
                    && s.labels.iter().zip(label_values).all(|((_, v), want)| v == want)
            })
            .map(|s| s.value)
    }
}

/// Result of one gather: families sorted by name, plus non-fatal errors.
#[derive(Debug, Default)]
pub struct Gathered {
    pub families: Vec<MetricFamily>,
    pub errors: Vec<PromscopeError>,
}

impl Gathered {
    pub fn family(&self, name: &str) -> Option<&MetricFamily> {
        self.families.iter().find(|f| f.name == name)
    }
}

/// Accumulates families by name and rejects duplicate series.
#[derive(Default)]
pub(crate) struct FamilySet {
    by_name: BTreeMap<String, MetricFamily>,
    seen: HashSet<(String, Vec<(String, String)>)>,
}

impl FamilySet {
    /// Check that a staged batch fits the families built so far.
    ///
    /// Returns the validated `(family, series)` pairs without committing
    /// anything, so a bad batch leaves the set untouched.
    pub(crate) fn stage(&self, samples: Vec<Sample>) -> Result<Vec<(MetricFamily, Series)>> {
        let mut staged: Vec<(MetricFamily, Series)> = Vec::with_capacity(samples.len());
        let mut local_seen = HashSet::new();

        for s in samples {
            s.desc.check_arity(s.label_values.len())?;
            let name = s.desc.name().to_string();
            let labels = s.label_pairs();
            let label_names = s.desc.label_names();
            let existing = self
                .by_name
                .get(&name)
                .or_else(|| staged.iter().map(|(f, _)| f).find(|f| f.name == name));
            if let Some(f) = existing {
                if f.kind != s.kind {
                    return Err(PromscopeError::InconsistentSample {
                        name,
                        detail: format!(
                            "collected as {} but family is {}",
                            s.kind.as_str(),
                            f.kind.as_str()
                        ),
                    });
                }
                if f.label_names != label_names {
                    return Err(PromscopeError::InconsistentSample {
                        name,
                        detail: format!(
                            "labels [{}] but family has [{}]",
                            label_names.join(","),
                            f.label_names.join(",")
                        ),
                    });
                }
            }

            let series_key = (name.clone(), labels.clone());
            if self.seen.contains(&series_key) || !local_seen.insert(series_key) {
                return Err(PromscopeError::DuplicateSeries(render_series(&name, &labels)));
            }

            let family = MetricFamily {
                name,
                help: s.desc.help().to_string(),
                kind: s.kind,
                label_names,
                metrics: Vec::new(),
            };
            staged.push((
                family,
                Series {
                    labels,
                    value: s.value,
                },
            ));
        }
        Ok(staged)
    }

    pub(crate) fn commit(&mut self, staged: Vec<(MetricFamily, Series)>) {
        for (family, series) in staged {
            self.seen
                .insert((family.name.clone(), series.labels.clone()));
            self.by_name
                .entry(family.name.clone())
                .or_insert(family)
                .metrics
                .push(series);
        }
    }

    /// Merge a whole family coming from another gatherer.
    ///
    /// Schema mismatches are fatal; a repeated series keeps the first value
    /// and is reported.
    pub(crate) fn merge_family(
        &mut self,
        mut family: MetricFamily,
        errors: &mut Vec<PromscopeError>,
    ) -> Result<()> {
        if let Some(existing) = self.by_name.get(&family.name) {
            if let Some(detail) = existing.schema_conflict(&family) {
                return Err(PromscopeError::SchemaConflict {
                    name: family.name,
                    detail,
                });
            }
        }

        let metrics = std::mem::take(&mut family.metrics);
        let target = self
            .by_name
            .entry(family.name.clone())
            .or_insert(family);
        for series in metrics {
            let key = (target.name.clone(), series.labels.clone());
            if self.seen.contains(&key) {
                errors.push(PromscopeError::DuplicateSeries(render_series(
                    &target.name,
                    &series.labels,
                )));
                continue;
            }
            self.seen.insert(key);
            target.metrics.push(series);
        }
        Ok(())
    }

    /// Sorted families with sorted series.
    pub(crate) fn finish(self) -> Vec<MetricFamily> {
        self.by_name
            .into_values()
            .map(|mut f| {
                f.metrics.sort_by(|a, b| a.labels.cmp(&b.labels));
                f
            })
            .collect()
    }
}

fn render_series(name: &str, labels: &[(String, String)]) -> String {
    let l = labels
        .iter()
        .map(|(k, v)| format!("{k}={v:?}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}{{{l}}}")
}
