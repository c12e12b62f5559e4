//! Shared test fixtures for the catalogue integration tests.
//!
//! Provides an in-memory [`FakeFetcher`] standing in for the upstream API,
//! payload builders, and `setup_catalogue()` which wires a [`Catalogue`] to a
//! temporary data directory.

#![allow(dead_code)]

use async_trait::async_trait;
use game_catalogue::{Catalogue, CatalogueError, Fetcher, Result, Source};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

pub const UPSTREAM: &str = "http://upstream.test";

pub fn url_for(source: Source) -> String {
    format!("{}/{}", UPSTREAM, source.key())
}

/// Upstream stand-in: canned bodies or failures per URL, with a call counter
/// and an optional gate that holds every fetch until permits are added.
#[derive(Default)]
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, std::result::Result<String, String>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetcher whose calls block until `gate` has permits.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn respond(&self, source: Source, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url_for(source), Ok(body.into()));
    }

    pub fn fail(&self, source: Source, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url_for(source), Err(message.to_string()));
    }

    /// Serve `body` for every source.
    pub fn respond_all(&self, body: &str) {
        for source in Source::ALL {
            self.respond(source, body);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(CatalogueError::Internal(message)),
            None => Err(CatalogueError::NotFound(format!("no canned response for {}", url))),
        }
    }
}

/// Panics on its first call, then serves an empty snapshot for every URL.
#[derive(Default)]
pub struct PanicOnceFetcher {
    panicked: AtomicBool,
    calls: AtomicUsize,
}

impl PanicOnceFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for PanicOnceFetcher {
    async fn fetch(&self, _url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("upstream client blew up");
        }
        Ok("[]".to_string())
    }
}

/// A game record as upstream sends it.
pub fn game(concept_id: i64, name: &str) -> serde_json::Value {
    json!({
        "conceptId": concept_id,
        "name": name,
        "nameEn": name,
        "conceptUrl": format!("https://store.example/concept/{}", concept_id),
        "imageUrl": format!("https://img.example/{}.png", concept_id),
        "device": ["PS4", "PS5"],
        "releaseDate": "2020-01-01T00:00:00Z"
    })
}

/// A one-group snapshot payload.
pub fn payload(catalog_key: &str, games: Vec<serde_json::Value>) -> String {
    serde_json::to_string(&json!([{
        "catalogKey": catalog_key,
        "count": games.len(),
        "games": games
    }]))
    .unwrap()
}

/// Distinct, valid payloads for every source with one overlapping game
/// (concept 100) shared by included-games and classics.
pub fn respond_with_sample_data(fetcher: &FakeFetcher) {
    fetcher.respond(
        Source::IncludedGames,
        payload(
            "included-games",
            vec![game(100, "Zeta Quest"), game(101, "alpha Strike")],
        ),
    );
    fetcher.respond(
        Source::Classics,
        payload(
            "classics",
            vec![game(100, "Zeta Quest (Classic)"), game(200, "Bubble Bobble")],
        ),
    );
    fetcher.respond(Source::Monthly, payload("monthly", vec![game(300, "Monthly Hit")]));
    fetcher.respond(
        Source::UbisoftClassics,
        payload("ubisoft-classics", vec![game(400, "Assassin Tale")]),
    );
}

/// Create a `Catalogue` backed by a temporary data directory and `fetcher`.
///
/// The caller must keep the `TempDir` alive for the duration of the test.
pub fn setup_catalogue(fetcher: Arc<FakeFetcher>) -> (Catalogue, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let catalogue = Catalogue::builder()
        .data_dir(tmp_dir.path())
        .upstream_base(UPSTREAM)
        .fetcher(fetcher)
        .build()
        .unwrap();
    (catalogue, tmp_dir)
}

/// Like [`setup_catalogue`], for any fetcher and a custom scheduler interval.
pub fn setup_catalogue_with(
    fetcher: Arc<dyn Fetcher>,
    check_interval: Duration,
) -> (Catalogue, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let catalogue = Catalogue::builder()
        .data_dir(tmp_dir.path())
        .upstream_base(UPSTREAM)
        .fetcher(fetcher)
        .check_interval(check_interval)
        .build()
        .unwrap();
    (catalogue, tmp_dir)
}
