use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// SourceStatus: outcome of one source during a refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub ok: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceStatus {
    pub fn success(games: usize) -> Self {
        Self {
            ok: true,
            updated_at: Utc::now(),
            games: Some(games),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            updated_at: Utc::now(),
            games: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// RefreshReport: aggregated outcome of a refresh run
// ---------------------------------------------------------------------------

/// Result of one completed refresh attempt.
///
/// `statuses` is keyed by source key; a `merged` entry is present only when
/// every source succeeded and the merged snapshot was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub statuses: BTreeMap<String, SourceStatus>,
    pub any_failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshReport {
    /// True when the merged snapshot was regenerated and listeners ran.
    pub fn is_complete(&self) -> bool {
        !self.any_failed && self.error.is_none()
    }
}

// ---------------------------------------------------------------------------
// SnapshotInfo: freshness of one source file on disk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub source: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub stale: bool,
}
