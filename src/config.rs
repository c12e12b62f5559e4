use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CatalogueError;

/// Snapshots older than this are refetched.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(3 * 24 * 60 * 60);
/// How often the scheduler re-checks snapshot freshness.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// File stem and `catalogKey` of the merged snapshot.
pub const MERGED_KEY: &str = "all";
pub const MERGED_CATALOGUE_NAME: &str = "All Games";
pub const MERGED_DESCRIPTION: &str =
    "Every game across all catalogues, de-duplicated and sorted by name";

/// The upstream catalogues that are mirrored locally.
///
/// Declaration order is the de-duplication priority used when building the
/// all-sources view: a game listed in several catalogues keeps the record
/// from the first one here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    IncludedGames,
    Classics,
    Monthly,
    UbisoftClassics,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::IncludedGames,
        Source::Classics,
        Source::Monthly,
        Source::UbisoftClassics,
    ];

    /// Stable key used for file names, URLs and status maps.
    pub fn key(self) -> &'static str {
        match self {
            Source::IncludedGames => "included-games",
            Source::Classics => "classics",
            Source::Monthly => "monthly",
            Source::UbisoftClassics => "ubisoft-classics",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.key())
    }

    pub fn catalogue_name(self) -> &'static str {
        match self {
            Source::IncludedGames => "Game Catalogue",
            Source::Classics => "Classics Catalogue",
            Source::Monthly => "Monthly Games",
            Source::UbisoftClassics => "Ubisoft+ Classics",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Source::IncludedGames => "Games included in the subscription catalogue",
            Source::Classics => "Classic titles from earlier console generations",
            Source::Monthly => "Games offered this month",
            Source::UbisoftClassics => "Ubisoft titles included with the subscription",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Source {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.key() == s)
            .ok_or_else(|| CatalogueError::NotFound(format!("Unknown catalogue: {}", s)))
    }
}

/// Default upstream URL for a source: `<base>/<key>`.
pub fn source_url(base: &str, source: Source) -> String {
    format!("{}/{}", base.trim_end_matches('/'), source.key())
}

pub fn merged_file_name() -> String {
    format!("{}.json", MERGED_KEY)
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("game-catalogue")
    } else {
        PathBuf::from(".game-catalogue")
    }
}
