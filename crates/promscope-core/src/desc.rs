//! Metric descriptors.
//!
//! A [`Desc`] is the immutable identity of a metric: fully-qualified name,
//! help text, const labels and variable label names. Descriptors are shared
//! via `Arc` between the points, collectors and the registry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{PromscopeError, Result};

/// Label name -> value mapping (sorted, deterministic iteration).
pub type Labels = BTreeMap<String, String>;

/// Immutable metric descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    name: String,
    help: String,
    const_labels: Labels,
    variable_labels: Vec<String>,
}

/// Identity of a descriptor: name, const labels and the *set* of variable
/// label names. Help is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescKey {
    name: String,
    const_labels: Vec<(String, String)>,
    variable_labels: Vec<String>,
}

impl Desc {
    /// Build and validate a descriptor.
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        variable_labels: Vec<String>,
        const_labels: Labels,
    ) -> Result<Self> {
        let name = name.into();
        if !is_valid_metric_name(&name) {
            return Err(PromscopeError::InvalidName(name));
        }

        for k in const_labels.keys() {
            if !is_valid_label_name(k) {
                return Err(PromscopeError::InvalidLabelName(k.clone()));
            }
        }

        let mut seen = BTreeSet::new();
        for l in &variable_labels {
            if !is_valid_label_name(l) {
                return Err(PromscopeError::InvalidLabelName(l.clone()));
            }
            if const_labels.contains_key(l) {
                return Err(PromscopeError::LabelCollision(l.clone()));
            }
            if !seen.insert(l.as_str()) {
                return Err(PromscopeError::DuplicateLabel(l.clone()));
            }
        }

        Ok(Self {
            name,
            help: help.into(),
            const_labels,
            variable_labels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn const_labels(&self) -> &Labels {
        &self.const_labels
    }

    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    /// Identity used for duplicate detection.
    pub fn key(&self) -> DescKey {
        let mut variable_labels = self.variable_labels.clone();
        variable_labels.sort();
        DescKey {
            name: self.name.clone(),
            const_labels: self
                .const_labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            variable_labels,
        }
    }

    /// True when both descriptors denote the same metric identity.
    pub fn is_identical(&self, other: &Desc) -> bool {
        self.key() == other.key()
    }

    /// All label names (const + variable), sorted.
    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .const_labels
            .keys()
            .cloned()
            .chain(self.variable_labels.iter().cloned())
            .collect();
        names.sort();
        names
    }

    /// Merge const labels with the given variable values into sorted pairs.
    /// Caller guarantees the arity.
    pub(crate) fn label_pairs(&self, values: &[String]) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .const_labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .chain(
                self.variable_labels
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned()),
            )
            .collect();
        pairs.sort();
        pairs
    }

    /// Check that `got` values match the variable label arity.
    pub(crate) fn check_arity(&self, got: usize) -> Result<()> {
        if got != self.variable_labels.len() {
            return Err(PromscopeError::Cardinality {
                name: self.name.clone(),
                expected: self.variable_labels.len(),
                got,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Desc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.const_labels.is_empty() {
            let c = self
                .const_labels
                .iter()
                .map(|(k, v)| format!("{k}={v:?}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "{{{c}}}")?;
        }
        if !self.variable_labels.is_empty() {
            write!(f, " [{}]", self.variable_labels.join(","))?;
        }
        Ok(())
    }
}

/// Builder for descriptors of single metrics and vectors.
///
/// `namespace`, `subsystem` and `name` are joined with `_`, skipping empty
/// parts.
#[derive(Debug, Clone, Default)]
pub struct Opts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    pub const_labels: Labels,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            ..Default::default()
        }
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn subsystem(mut self, sub: impl Into<String>) -> Self {
        self.subsystem = sub.into();
        self
    }

    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    /// Fully-qualified metric name.
    pub fn fq_name(&self) -> String {
        [&self.namespace, &self.subsystem, &self.name]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Build a descriptor with the given variable label names.
    pub fn describe(&self, variable_labels: &[&str]) -> Result<Desc> {
        Desc::new(
            self.fq_name(),
            self.help.clone(),
            variable_labels.iter().map(|s| s.to_string()).collect(),
            self.const_labels.clone(),
        )
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
