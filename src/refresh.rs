//! Refresh coordination: fetch every source, persist what succeeded, and
//! regenerate the merged snapshot only when nothing failed.
//!
//! At most one refresh runs per [`RefreshCoordinator`]. A second call made
//! while one is in flight returns [`RefreshOutcome::InProgress`] without
//! touching the network or the disk.

use std::collections::BTreeMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Source;
use crate::error::{CatalogueError, Result};
use crate::merge;
use crate::models::{RefreshReport, Snapshot, SourceStatus};
use crate::store::SnapshotStore;

/// Status map key for the merged snapshot.
pub const MERGED_STATUS_KEY: &str = "merged";

// ---------------------------------------------------------------------------
// Fetch capability
// ---------------------------------------------------------------------------

/// Retrieves the raw body of an upstream snapshot.
///
/// The body is returned untouched so it can be stored byte for byte.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// [`Fetcher`] over HTTP with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Notified after a refresh in which every source succeeded and the merged
/// snapshot was rewritten.
pub trait RefreshListener: Send + Sync {
    fn on_refresh(&self, report: &RefreshReport) -> Result<()>;
}

// ---------------------------------------------------------------------------
// RefreshCoordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Another refresh was already running; nothing was done.
    InProgress,
    Finished(RefreshReport),
}

/// Clears the refreshing flag on every exit path, including panics and
/// dropped futures.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RefreshCoordinator {
    store: Arc<SnapshotStore>,
    fetcher: Arc<dyn Fetcher>,
    urls: BTreeMap<Source, String>,
    refreshing: AtomicBool,
    listeners: Mutex<Vec<Arc<dyn RefreshListener>>>,
}

impl RefreshCoordinator {
    /// `urls` maps each source to its upstream endpoint. A source without a
    /// URL fails every refresh, which keeps the merged snapshot untouched.
    pub fn new(
        store: Arc<SnapshotStore>,
        fetcher: Arc<dyn Fetcher>,
        urls: BTreeMap<Source, String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            urls,
            refreshing: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener for successful refreshes.
    pub fn subscribe(&self, listener: Arc<dyn RefreshListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Run one refresh.
    ///
    /// Fetch and parse failures are reported per source in the returned
    /// report and never surface as errors. Failures while rebuilding the
    /// merged snapshot, and panics anywhere in the run, land in
    /// [`RefreshReport::error`].
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            info!("refresh requested while another is running");
            return RefreshOutcome::InProgress;
        };

        info!(sources = Source::ALL.len(), "refresh started");
        let report = match AssertUnwindSafe(self.run()).catch_unwind().await {
            Ok(report) => report,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "refresh panicked");
                RefreshReport {
                    any_failed: true,
                    error: Some(format!("refresh panicked: {}", message)),
                    ..RefreshReport::default()
                }
            }
        };

        RefreshOutcome::Finished(report)
    }

    async fn run(&self) -> RefreshReport {
        let results = join_all(Source::ALL.into_iter().map(|source| self.refresh_source(source))).await;

        let mut report = RefreshReport::default();
        for (source, status) in results {
            report.statuses.insert(source.key().to_string(), status);
        }
        report.any_failed = report.statuses.values().any(|status| !status.ok);

        if report.any_failed {
            let failed: Vec<&str> = report
                .statuses
                .iter()
                .filter(|(_, status)| !status.ok)
                .map(|(key, _)| key.as_str())
                .collect();
            warn!(?failed, "refresh incomplete, merged snapshot left as is");
            return report;
        }

        match self.rebuild_merged().await {
            Ok(games) => {
                report
                    .statuses
                    .insert(MERGED_STATUS_KEY.to_string(), SourceStatus::success(games));
                info!(games, "refresh complete, merged snapshot rewritten");
                self.notify(&report);
            }
            Err(e) => {
                error!(error = %e, "failed to rebuild merged snapshot");
                report.error = Some(e.to_string());
            }
        }

        report
    }

    async fn refresh_source(&self, source: Source) -> (Source, SourceStatus) {
        match self.fetch_and_store(source).await {
            Ok(games) => {
                info!(source = source.key(), games, "snapshot updated");
                (source, SourceStatus::success(games))
            }
            Err(e) => {
                warn!(source = source.key(), error = %e, "snapshot refresh failed");
                (source, SourceStatus::failure(e.to_string()))
            }
        }
    }

    async fn fetch_and_store(&self, source: Source) -> Result<usize> {
        let fetch_error = |message: String| CatalogueError::Fetch {
            source_key: source.key().to_string(),
            message,
        };

        let url = self
            .urls
            .get(&source)
            .ok_or_else(|| fetch_error("no upstream URL configured".to_string()))?;
        let raw = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        // Unparseable payloads must not replace a good file.
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .map_err(|e| fetch_error(format!("payload is not a grouped snapshot: {}", e)))?;

        self.store.write(source, &raw)?;
        Ok(merge::flatten(snapshot).len())
    }

    /// Read back every freshly written source and replace the merged file.
    /// File IO and parsing run on the blocking pool.
    async fn rebuild_merged(&self) -> Result<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || write_merged_snapshot(&store))
            .await
            .map_err(|e| CatalogueError::Internal(format!("Task join error: {e}")))?
    }

    fn notify(&self, report: &RefreshReport) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        for listener in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_refresh(report))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "refresh listener failed"),
                Err(_) => error!("refresh listener panicked"),
            }
        }
    }
}

fn write_merged_snapshot(store: &SnapshotStore) -> Result<usize> {
    let snapshots = Source::ALL
        .into_iter()
        .map(|source| store.read(source))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge::merge_snapshots(snapshots);
    let games = merged
        .iter()
        .map(|group| group.games.as_ref().map_or(0, Vec::len))
        .sum();
    store.write_merged(&merged)?;
    Ok(games)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
