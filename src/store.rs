//! File-backed persistence of per-source snapshots and the merged snapshot.
//!
//! Each known source owns one file holding the last payload fetched for it,
//! stored exactly as received. The merged snapshot is written by this crate
//! as pretty-printed JSON. Files are the only durable state.

use crate::config::{self, Source};
use crate::error::{CatalogueError, Result};
use crate::models::{Snapshot, SnapshotInfo};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Reads and writes snapshot files under a single data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Directory holding one file per source plus the merged file.
    pub data_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `data_dir`.
    ///
    /// If `data_dir` is `None`, uses the platform-appropriate data directory.
    /// Creates the directory if it does not exist.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let dir = data_dir.unwrap_or_else(config::default_data_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { data_dir: dir })
    }

    pub fn path(&self, source: Source) -> PathBuf {
        self.data_dir.join(source.file_name())
    }

    pub fn merged_path(&self) -> PathBuf {
        self.data_dir.join(config::merged_file_name())
    }

    /// Read and parse the snapshot stored for `source`.
    ///
    /// Fails with [`CatalogueError::NotFound`] when nothing has been stored
    /// yet and [`CatalogueError::Parse`] when the file is not a grouped
    /// snapshot.
    pub fn read(&self, source: Source) -> Result<Snapshot> {
        read_snapshot(&self.path(source))
    }

    /// Store the payload for `source` byte for byte, replacing any previous one.
    pub fn write(&self, source: Source, raw: &str) -> Result<()> {
        replace_file(&self.path(source), raw.as_bytes())
    }

    pub fn read_merged(&self) -> Result<Snapshot> {
        read_snapshot(&self.merged_path())
    }

    /// Serialize `snapshot` pretty-printed and replace the merged file.
    pub fn write_merged(&self, snapshot: &Snapshot) -> Result<()> {
        let mut body = serde_json::to_string_pretty(snapshot)?;
        body.push('\n');
        replace_file(&self.merged_path(), body.as_bytes())
    }

    /// Last write time of the file for `source`, if it exists.
    pub fn last_modified(&self, source: Source) -> Option<DateTime<Utc>> {
        modified_at(&self.path(source)).map(DateTime::<Utc>::from)
    }

    /// A source is stale when its file is missing or at least `stale_after` old.
    pub fn is_stale(&self, source: Source, stale_after: Duration) -> bool {
        match modified_at(&self.path(source)) {
            None => true,
            // A timestamp in the future counts as fresh.
            Some(modified) => SystemTime::now()
                .duration_since(modified)
                .map(|age| age >= stale_after)
                .unwrap_or(false),
        }
    }

    /// Sources needing a refresh, in priority order.
    pub fn stale_sources(&self, stale_after: Duration) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|source| self.is_stale(*source, stale_after))
            .collect()
    }

    pub fn snapshot_info(&self, stale_after: Duration) -> Vec<SnapshotInfo> {
        Source::ALL
            .into_iter()
            .map(|source| SnapshotInfo {
                source: source.key().to_string(),
                last_modified: self.last_modified(source),
                stale: self.is_stale(source, stale_after),
            })
            .collect()
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CatalogueError::NotFound(format!(
                "Snapshot {} has not been fetched yet",
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown")
            )));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&contents).map_err(|source| CatalogueError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to a sibling temp file and rename it over `dest`, so an interrupted
/// write never leaves a truncated snapshot behind.
fn replace_file(dest: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_dest = dest.with_extension(format!(
        "{}.tmp",
        dest.extension().and_then(|e| e.to_str()).unwrap_or("")
    ));

    let result = (|| -> Result<()> {
        fs::write(&tmp_dest, bytes)?;
        fs::rename(&tmp_dest, dest)?;
        Ok(())
    })();

    match &result {
        Ok(()) => debug!(path = %dest.display(), bytes = bytes.len(), "snapshot written"),
        Err(_) => {
            let _ = fs::remove_file(&tmp_dest);
        }
    }

    result
}
