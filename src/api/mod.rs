//! HTTP surface: catalogue views, snapshot freshness and the admin refresh
//! trigger.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::Catalogue;

pub use error::ApiError;

/// Header carrying the shared secret for admin endpoints.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    pub catalogue: Catalogue,

    /// Shared secret for the admin refresh trigger. When `None`, every admin
    /// request is rejected.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(catalogue: Catalogue, admin_token: Option<String>) -> Self {
        Self {
            catalogue,
            admin_token: admin_token.filter(|token| !token.is_empty()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/catalogues/{name}", get(routes::catalogues::get_catalogue))
        .route("/api/snapshots", get(routes::catalogues::list_snapshots))
        .route("/api/admin/refresh", post(routes::admin::trigger_refresh))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
