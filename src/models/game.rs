use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ConceptId: upstream identifier shared by every catalogue
// ---------------------------------------------------------------------------

/// Upstream concept identifier.
///
/// Upstream sends it either as a JSON number or a string; the original shape
/// is kept so snapshots re-serialize the way they were received. The
/// [`Display`](fmt::Display) form is the canonical key used for hashing and
/// de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConceptId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptId::Int(n) => write!(f, "{}", n),
            ConceptId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConceptId {
    fn from(s: &str) -> Self {
        ConceptId::Text(s.to_string())
    }
}

impl From<i64> for ConceptId {
    fn from(n: i64) -> Self {
        ConceptId::Int(n)
    }
}

// ---------------------------------------------------------------------------
// RawGame: a game record exactly as upstream describes it
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    pub concept_id: ConceptId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    /// Upstream fields this service does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawGame {
    /// Minimal record, mostly useful for building fixtures.
    pub fn new(concept_id: impl Into<ConceptId>, name: impl Into<String>) -> Self {
        Self {
            concept_id: concept_id.into(),
            name: Some(name.into()),
            name_en: None,
            concept_url: None,
            image_url: None,
            device: None,
            release_date: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Sort key; a missing name sorts as the empty string.
    pub fn sort_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// PublicGame: the shape served to API clients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicGame {
    pub id: String,
    pub concept_id: ConceptId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(
        rename = "available_on",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub available_on: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}
