use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::cache::ViewKey;
use crate::config::{self, Source};
use crate::models::{CatalogueView, SnapshotInfo};

/// GET /api/catalogues/{name}
///
/// One catalogue as a single-element array. `name` is a source key such as
/// `classics`, or `all` for the de-duplicated view across every source.
pub async fn get_catalogue(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<CatalogueView>>, ApiError> {
    let key = if name == config::MERGED_KEY {
        ViewKey::All
    } else {
        ViewKey::Source(name.parse::<Source>()?)
    };
    let view = state.catalogue.view_async(key).await?;

    Ok(Json(vec![view.as_ref().clone()]))
}

/// GET /api/snapshots
///
/// Last update time and staleness of every source file.
pub async fn list_snapshots(State(state): State<Arc<AppState>>) -> Json<Vec<SnapshotInfo>> {
    Json(state.catalogue.snapshots())
}
