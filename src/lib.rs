//! Game catalogue service.
//!
//! Mirrors a fixed set of upstream game catalogues into local snapshot files,
//! refreshes them when they go stale, and serves de-duplicated, sorted views
//! of them from an in-memory cache.
//!
//! # Quick start
//!
//! ```no_run
//! use game_catalogue::{Catalogue, Source};
//!
//! # async fn example() -> game_catalogue::Result<()> {
//! let catalogue = Catalogue::builder()
//!     .upstream_base("https://catalogue.example.com/api")
//!     .build()?;
//!
//! // Fetch everything once, then serve views from the cache
//! catalogue.refresh().await;
//! let classics = catalogue.source_view(Source::Classics)?;
//! let everything = catalogue.all_view()?;
//!
//! // Keep snapshots fresh in the background
//! let scheduler = catalogue.spawn_scheduler();
//! scheduler.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ident;
pub mod merge;
pub mod models;
pub mod refresh;
pub mod schedule;
pub mod store;

pub use cache::{ViewCache, ViewKey};
pub use config::Source;
pub use error::{CatalogueError, Result};
pub use refresh::{Fetcher, HttpFetcher, RefreshCoordinator, RefreshListener, RefreshOutcome};
pub use schedule::RefreshLoopHandle;
pub use store::SnapshotStore;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use models::{CatalogueView, SnapshotInfo};

// ---------------------------------------------------------------------------
// CatalogueBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Catalogue`].
///
/// Use [`Catalogue::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](CatalogueBuilder::build).
pub struct CatalogueBuilder {
    data_dir: Option<PathBuf>,
    upstream_base: Option<String>,
    source_urls: BTreeMap<Source, String>,
    fetch_timeout: Duration,
    stale_after: Duration,
    check_interval: Duration,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl Default for CatalogueBuilder {
    fn default() -> Self {
        Self {
            data_dir: None,
            upstream_base: None,
            source_urls: BTreeMap::new(),
            fetch_timeout: config::DEFAULT_FETCH_TIMEOUT,
            stale_after: config::DEFAULT_STALE_AFTER,
            check_interval: config::DEFAULT_CHECK_INTERVAL,
            fetcher: None,
        }
    }
}

impl CatalogueBuilder {
    /// Set the directory holding snapshot files.
    ///
    /// If not set, the platform data directory is used (e.g.
    /// `~/.local/share/game-catalogue` on Linux).
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Base URL every source is fetched from, as `<base>/<source-key>`.
    pub fn upstream_base(mut self, base: impl Into<String>) -> Self {
        self.upstream_base = Some(base.into());
        self
    }

    /// Override the upstream URL of a single source.
    pub fn source_url(mut self, source: Source, url: impl Into<String>) -> Self {
        self.source_urls.insert(source, url.into());
        self
    }

    /// Per-request timeout for upstream fetches. Defaults to 30 seconds.
    /// Ignored when a custom fetcher is supplied.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Age after which a snapshot is refetched. Defaults to 3 days.
    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// How often the scheduler checks for stale snapshots. Defaults to 1 day.
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Replace the HTTP fetcher, e.g. with an in-memory one in tests.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Create the data directory and wire store, coordinator and cache.
    ///
    /// Nothing is fetched here; call [`Catalogue::refresh`] or start the
    /// scheduler.
    pub fn build(self) -> Result<Catalogue> {
        if self.check_interval.is_zero() {
            return Err(CatalogueError::InvalidArgument(
                "check interval must be greater than zero".into(),
            ));
        }

        let mut urls = BTreeMap::new();
        for source in Source::ALL {
            let url = match (self.source_urls.get(&source), &self.upstream_base) {
                (Some(url), _) => url.clone(),
                (None, Some(base)) => config::source_url(base, source),
                (None, None) => {
                    return Err(CatalogueError::InvalidArgument(format!(
                        "No upstream URL for {}; set upstream_base or source_url",
                        source
                    )))
                }
            };
            urls.insert(source, url);
        }

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(self.fetch_timeout)?),
        };

        let store = Arc::new(SnapshotStore::new(self.data_dir)?);
        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), fetcher, urls));
        let cache = Arc::new(ViewCache::new());
        coordinator.subscribe(cache.clone());

        Ok(Catalogue {
            store,
            coordinator,
            cache,
            stale_after: self.stale_after,
            check_interval: self.check_interval,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// The main entry point: owns the snapshot store, the refresh coordinator
/// and the view cache that listens to it.
///
/// Created via [`Catalogue::builder()`]. Independent instances share no
/// state, so several can live in one process.
pub struct Catalogue {
    store: Arc<SnapshotStore>,
    coordinator: Arc<RefreshCoordinator>,
    cache: Arc<ViewCache>,
    stale_after: Duration,
    check_interval: Duration,
}

impl Catalogue {
    pub fn builder() -> CatalogueBuilder {
        CatalogueBuilder::default()
    }

    // -- Views ---------------------------------------------------------------

    /// Sorted view of a single source, served from the cache when possible.
    pub fn source_view(&self, source: Source) -> Result<Arc<CatalogueView>> {
        self.view(ViewKey::Source(source))
    }

    /// De-duplicated view across every source, built from the merged snapshot.
    pub fn all_view(&self) -> Result<Arc<CatalogueView>> {
        self.view(ViewKey::All)
    }

    pub fn view(&self, key: ViewKey) -> Result<Arc<CatalogueView>> {
        load_view(&self.cache, &self.store, key)
    }

    /// Async variant of [`view`](Self::view) for request handlers.
    ///
    /// Cache hits return straight away; a miss reads and parses the snapshot
    /// on the blocking thread pool.
    pub async fn view_async(&self, key: ViewKey) -> Result<Arc<CatalogueView>> {
        if let Some(view) = self.cache.get(key)? {
            return Ok(view);
        }

        let cache = self.cache.clone();
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || load_view(&cache, &store, key))
            .await
            .map_err(|e| CatalogueError::Internal(format!("Task join error: {e}")))?
    }

    // -- Refresh -------------------------------------------------------------

    /// Run one refresh now, unless one is already running.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.coordinator.refresh_once().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Freshness of every source file.
    pub fn snapshots(&self) -> Vec<SnapshotInfo> {
        self.store.snapshot_info(self.stale_after)
    }

    /// Start the background staleness check. It runs once immediately.
    pub fn spawn_scheduler(&self) -> RefreshLoopHandle {
        schedule::spawn_refresh_loop(
            self.coordinator.clone(),
            self.stale_after,
            self.check_interval,
        )
    }

    // -- Accessors -----------------------------------------------------------

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }
}

fn load_view(cache: &ViewCache, store: &SnapshotStore, key: ViewKey) -> Result<Arc<CatalogueView>> {
    cache.get_or_compute(key, || match key {
        ViewKey::Source(source) => Ok(merge::source_view(source, store.read(source)?)),
        ViewKey::All => Ok(merge::all_view(store.read_merged()?)),
    })
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Catalogue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Catalogue(data_dir={}, cached_views={}, refreshing={})",
            self.store.data_dir.display(),
            self.cache.len(),
            self.is_refreshing()
        )
    }
}
