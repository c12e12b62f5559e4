//! In-memory memoization of catalogue views.
//!
//! Views are computed lazily on first read and kept until the next fully
//! successful refresh, which clears every entry at once. Reads during a
//! refresh keep getting the previous data until that happens.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::config::Source;
use crate::error::{CatalogueError, Result};
use crate::models::{CatalogueView, RefreshReport};
use crate::refresh::RefreshListener;

/// Cache key for one logical view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Source(Source),
    All,
}

#[derive(Default)]
struct Entries {
    views: HashMap<ViewKey, Arc<CatalogueView>>,
    /// Bumped by every invalidation.
    generation: u64,
}

#[derive(Default)]
pub struct ViewCache {
    entries: Mutex<Entries>,
    invalidations: AtomicU64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| CatalogueError::Internal("View cache lock poisoned".into()))
    }

    /// The memoized view for `key`, if any.
    pub fn get(&self, key: ViewKey) -> Result<Option<Arc<CatalogueView>>> {
        Ok(self.lock()?.views.get(&key).cloned())
    }

    /// Return the memoized view for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without the lock held. If the cache is invalidated
    /// while it runs, the result is returned but not stored, since it may
    /// have been built from pre-refresh files.
    pub fn get_or_compute<F>(&self, key: ViewKey, compute: F) -> Result<Arc<CatalogueView>>
    where
        F: FnOnce() -> Result<CatalogueView>,
    {
        let generation = {
            let entries = self.lock()?;
            if let Some(view) = entries.views.get(&key) {
                return Ok(view.clone());
            }
            entries.generation
        };

        debug!(?key, "view cache miss");
        let view = Arc::new(compute()?);

        let mut entries = self.lock()?;
        if entries.generation == generation {
            let stored = entries.views.entry(key).or_insert_with(|| view.clone());
            return Ok(stored.clone());
        }
        Ok(view)
    }

    /// Drop every memoized view in one step.
    pub fn invalidate_all(&self) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dropped = entries.views.len();
        entries.views.clear();
        entries.generation += 1;
        drop(entries);

        self.invalidations.fetch_add(1, Ordering::Relaxed);
        info!(dropped, "view cache invalidated");
    }

    /// How many times the cache has been invalidated.
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.views.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RefreshListener for ViewCache {
    fn on_refresh(&self, _report: &RefreshReport) -> Result<()> {
        self.invalidate_all();
        Ok(())
    }
}
