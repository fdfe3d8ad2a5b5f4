//! Gatherer trait and the multi-source merge layer.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::Result;
use crate::family::{FamilySet, Gathered};

/// Source of a complete snapshot.
///
/// `Err` means the snapshot as a whole is unusable and nothing may be
/// exposed; recoverable problems travel in [`Gathered::errors`].
pub trait Gatherer: Send + Sync {
    fn gather(&self) -> Result<Gathered>;
}

/// Ordered composition of gatherers.
///
/// Same-name families from different sources must agree on type, help and
/// label names, otherwise the whole gather fails. Compatible families are
/// merged; a series already seen keeps its first value and the repeat is
/// reported as `DuplicateSeries`.
#[derive(Clone, Default)]
pub struct Gatherers {
    sources: Vec<Arc<dyn Gatherer>>,
}

impl Gatherers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, g: Arc<dyn Gatherer>) -> Self {
        self.sources.push(g);
        self
    }

    pub fn push(&mut self, g: Arc<dyn Gatherer>) {
        self.sources.push(g);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<Arc<dyn Gatherer>> for Gatherers {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Gatherer>>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl Gatherer for Gatherers {
    fn gather(&self) -> Result<Gathered> {
        let mut set = FamilySet::default();
        let mut errors = Vec::new();

        for (idx, g) in self.sources.iter().enumerate() {
            let part = g.gather()?;
            errors.extend(part.errors);
            for family in part.families {
                if let Err(e) = set.merge_family(family, &mut errors) {
                    error!(source = idx, error = %e, "gatherers merge failed");
                    return Err(e);
                }
            }
        }

        let families = set.finish();
        debug!(
            sources = self.sources.len(),
            families = families.len(),
            errors = errors.len(),
            "gatherers merged"
        );
        Ok(Gathered { families, errors })
    }
}
