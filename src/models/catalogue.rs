use serde::{Deserialize, Serialize};

use super::game::{PublicGame, RawGame};

// ---------------------------------------------------------------------------
// CatalogGroup: one grouping inside an upstream snapshot
// ---------------------------------------------------------------------------

/// A group of games as published upstream.
///
/// `count` is copied through but never trusted; the real cardinality is
/// `games.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGroup {
    pub catalog_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games: Option<Vec<RawGame>>,
}

/// A whole snapshot file: an ordered list of groups.
pub type Snapshot = Vec<CatalogGroup>;

// ---------------------------------------------------------------------------
// CatalogueView: response body entry for the catalogue endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueView {
    pub catalogue_name: String,
    pub description: String,
    pub count: usize,
    pub games: Vec<PublicGame>,
}
