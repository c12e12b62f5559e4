//! Flattening, ordering and de-duplication of catalogue snapshots, and the
//! projections that turn them into API views.

use std::collections::HashSet;

use icu_collator::{Collator, CollatorOptions};
use tracing::warn;

use crate::config::{self, Source};
use crate::ident::derive_id;
use crate::models::{CatalogGroup, CatalogueView, PublicGame, RawGame, Snapshot};

/// Concatenate the games of every group, keeping their relative order.
/// Groups without a `games` field contribute nothing.
pub fn flatten(groups: impl IntoIterator<Item = CatalogGroup>) -> Vec<RawGame> {
    groups
        .into_iter()
        .flat_map(|group| group.games.unwrap_or_default())
        .collect()
}

fn root_collator() -> Option<Collator> {
    match Collator::try_new(&Default::default(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            warn!(error = %e, "collator unavailable, falling back to code point order");
            None
        }
    }
}

thread_local! {
    static ROOT_COLLATOR: Option<Collator> = root_collator();
}

/// Stable sort by `name` using Unicode collation rather than byte order.
pub fn sort_by_name(mut games: Vec<RawGame>) -> Vec<RawGame> {
    ROOT_COLLATOR.with(|collator| match collator {
        Some(collator) => games.sort_by(|a, b| collator.compare(a.sort_name(), b.sort_name())),
        None => games.sort_by(|a, b| a.sort_name().cmp(b.sort_name())),
    });
    games
}

/// Keep the first record seen for each concept id.
///
/// Callers pass games in source priority order ([`Source::ALL`]); later
/// duplicates are dropped whole, never merged field by field. Ids are
/// compared by their canonical string form, so `10001` and `"10001"` collide.
pub fn dedupe_by_concept_id(games: Vec<RawGame>) -> Vec<RawGame> {
    let mut seen = HashSet::with_capacity(games.len());
    games
        .into_iter()
        .filter(|game| seen.insert(game.concept_id.to_string()))
        .collect()
}

pub fn to_public_view(game: &RawGame) -> PublicGame {
    PublicGame {
        id: derive_id(&game.concept_id.to_string()),
        concept_id: game.concept_id.clone(),
        name: game.name.clone(),
        name_en: game.name_en.clone(),
        game_url: game.concept_url.clone(),
        image_url: game.image_url.clone(),
        available_on: game.device.clone(),
        release_date: game.release_date.clone(),
    }
}

/// Build the merged snapshot from per-source snapshots given in priority
/// order: each source is flattened and sorted on its own, then everything is
/// concatenated into a single group keyed [`config::MERGED_KEY`].
pub fn merge_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> Snapshot {
    let games: Vec<RawGame> = snapshots
        .into_iter()
        .flat_map(|snapshot| sort_by_name(flatten(snapshot)))
        .collect();

    vec![CatalogGroup {
        catalog_key: config::MERGED_KEY.to_string(),
        count: Some(serde_json::Value::from(games.len())),
        games: Some(games),
    }]
}

fn view(name: &str, description: &str, games: Vec<RawGame>) -> CatalogueView {
    let games: Vec<PublicGame> = games.iter().map(to_public_view).collect();
    CatalogueView {
        catalogue_name: name.to_string(),
        description: description.to_string(),
        count: games.len(),
        games,
    }
}

/// View of a single source: flattened, sorted by name, projected.
pub fn source_view(source: Source, snapshot: Snapshot) -> CatalogueView {
    view(
        source.catalogue_name(),
        source.description(),
        sort_by_name(flatten(snapshot)),
    )
}

/// View across every source, built from the merged snapshot: duplicates
/// removed first, then sorted by name.
pub fn all_view(merged: Snapshot) -> CatalogueView {
    view(
        config::MERGED_CATALOGUE_NAME,
        config::MERGED_DESCRIPTION,
        sort_by_name(dedupe_by_concept_id(flatten(merged))),
    )
}
