//! Collector registry.
//!
//! Registration rules:
//! - a collector must describe at least one descriptor;
//! - a name maps to exactly one descriptor identity across the registry;
//! - re-registering a collector whose descriptor set is already present is
//!   a no-op (`Registration::AlreadyRegistered`), never duplicated output;
//! - sharing some, but not all, descriptors with another collector is
//!   rejected.
//!
//! The collector list sits behind a read-mostly `RwLock`. `gather` copies
//! the list under the read lock and runs every `collect` after releasing it.

use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::collector::Collector;
use crate::desc::{Desc, DescKey};
use crate::error::{PromscopeError, Result};
use crate::family::{FamilySet, Gathered};
use crate::gatherer::Gatherer;
use crate::metric::Sample;

/// Outcome of a successful `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Collector stored; it takes part in every gather.
    Added,
    /// An identical collector was already present; nothing changed.
    AlreadyRegistered,
}

struct Entry {
    collector: Arc<dyn Collector>,
    keys: BTreeSet<DescKey>,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    by_name: HashMap<String, Arc<Desc>>,
}

/// Set of collectors with duplicate detection and merged gather.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
    pedantic: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with extra checks for instrumentation bugs: reserved label
    /// names, empty help, and samples for descriptors the collector never
    /// described.
    pub fn pedantic() -> Self {
        Self {
            inner: RwLock::default(),
            pedantic: true,
        }
    }

    pub fn is_pedantic(&self) -> bool {
        self.pedantic
    }

    // Poisoning only means a writer panicked mid-update; the map itself is
    // still structurally valid.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<Registration> {
        let cname = collector.name().to_string();
        let res = self.try_register(collector);
        match &res {
            Ok(r) => debug!(collector = %cname, outcome = ?r, "collector registered"),
            Err(e) => warn!(collector = %cname, error = %e, "collector registration rejected"),
        }
        res
    }

    fn try_register(&self, collector: Arc<dyn Collector>) -> Result<Registration> {
        let cname = collector.name().to_string();

        let mut descs: Vec<Arc<Desc>> = Vec::new();
        for d in collector.describe() {
            if self.pedantic {
                pedantic_check(&d)?;
            }
            match descs.iter().find(|p| p.name() == d.name()) {
                Some(prev) if prev.is_identical(&d) => continue,
                Some(prev) => {
                    return Err(PromscopeError::DescriptorConflict(format!(
                        "collector {cname:?} describes {prev} and {d} under one name"
                    )))
                }
                None => descs.push(d),
            }
        }
        if descs.is_empty() {
            return Err(PromscopeError::NoDescriptors(cname));
        }
        let keys: BTreeSet<DescKey> = descs.iter().map(|d| d.key()).collect();

        let mut inner = self.write();
        if inner.entries.iter().any(|e| e.keys == keys) {
            for d in &descs {
                if let Some(existing) = inner.by_name.get(d.name()) {
                    if existing.help() != d.help() {
                        warn!(
                            collector = %cname,
                            metric = %d.name(),
                            registered = %existing.help(),
                            offered = %d.help(),
                            "re-registration with different help, keeping the registered one"
                        );
                    }
                }
            }
            return Ok(Registration::AlreadyRegistered);
        }

        for d in &descs {
            let Some(existing) = inner.by_name.get(d.name()) else {
                continue;
            };
            if existing.is_identical(d) {
                return Err(PromscopeError::AlreadyRegistered(format!(
                    "descriptor {d} is owned by another collector"
                )));
            }
            return Err(PromscopeError::DescriptorConflict(format!(
                "a previously registered descriptor {existing} has the same name as {d} but different labels"
            )));
        }

        for d in descs {
            inner.by_name.insert(d.name().to_string(), d);
        }
        inner.entries.push(Entry { collector, keys });
        Ok(Registration::Added)
    }

    /// Register in order, stopping at the first error.
    pub fn register_all<I>(&self, collectors: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn Collector>>,
    {
        for c in collectors {
            self.register(c)?;
        }
        Ok(())
    }

    /// Remove the collector whose descriptor set matches `collector`'s.
    pub fn unregister(&self, collector: &dyn Collector) -> bool {
        let keys: BTreeSet<DescKey> = collector.describe().map(|d| d.key()).collect();

        let mut inner = self.write();
        let Some(pos) = inner.entries.iter().position(|e| e.keys == keys) else {
            return false;
        };
        let entry = inner.entries.remove(pos);
        inner.by_name.retain(|_, d| !entry.keys.contains(&d.key()));
        debug!(collector = %collector.name(), "collector unregistered");
        true
    }

    /// Every registered descriptor, sorted by name.
    pub fn descs(&self) -> Vec<Arc<Desc>> {
        let inner = self.read();
        let mut out: Vec<Arc<Desc>> = inner.by_name.values().cloned().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    fn snapshot_entries(&self) -> Vec<(Arc<dyn Collector>, BTreeSet<DescKey>)> {
        self.read()
            .entries
            .iter()
            .map(|e| (Arc::clone(&e.collector), e.keys.clone()))
            .collect()
    }

    /// Drain one collector, validating every sample before anything is kept.
    fn collect_one(&self, c: &dyn Collector, keys: &BTreeSet<DescKey>) -> Result<Vec<Sample>> {
        let run = || -> Result<Vec<Sample>> {
            let mut out = Vec::new();
            for item in c.collect() {
                let s = item?;
                if self.pedantic && !keys.contains(&s.desc.key()) {
                    return Err(PromscopeError::Pedantic(format!(
                        "collected metric {} was not described",
                        s.desc
                    )));
                }
                out.push(s);
            }
            Ok(out)
        };
        catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|_| {
            Err(PromscopeError::Assessment("collector panicked".into()))
        })
    }
}

impl Gatherer for Registry {
    /// Continue-on-error: a failing collector is dropped from the snapshot
    /// and reported once; never returns `Err`.
    fn gather(&self) -> Result<Gathered> {
        let entries = self.snapshot_entries();
        let mut set = FamilySet::default();
        let mut errors = Vec::new();

        for (c, keys) in &entries {
            let staged = self
                .collect_one(c.as_ref(), keys)
                .and_then(|samples| set.stage(samples));
            match staged {
                Ok(staged) => set.commit(staged),
                Err(e) => {
                    warn!(collector = %c.name(), error = %e, "collector failed, excluded from snapshot");
                    errors.push(PromscopeError::Collect {
                        collector: c.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let families = set.finish();
        debug!(
            collectors = entries.len(),
            families = families.len(),
            errors = errors.len(),
            "registry gathered"
        );
        Ok(Gathered { families, errors })
    }
}

fn pedantic_check(d: &Desc) -> Result<()> {
    if d.help().is_empty() {
        return Err(PromscopeError::Pedantic(format!("{d} has empty help")));
    }
    if let Some(l) = d.label_names().into_iter().find(|l| l.starts_with("__")) {
        return Err(PromscopeError::Pedantic(format!(
            "{d} uses reserved label name {l:?}"
        )));
    }
    Ok(())
}
