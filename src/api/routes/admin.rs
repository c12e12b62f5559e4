use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::warn;

use crate::api::error::ApiError;
use crate::api::{AppState, ADMIN_TOKEN_HEADER};
use crate::error::CatalogueError;
use crate::refresh::RefreshOutcome;

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), CatalogueError> {
    let Some(expected) = state.admin_token.as_deref() else {
        warn!("admin refresh rejected: no admin token configured");
        return Err(CatalogueError::Unauthorized);
    };

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if constant_time_eq(provided, expected.as_bytes()) {
        Ok(())
    } else {
        warn!("admin refresh rejected: bad token");
        Err(CatalogueError::Unauthorized)
    }
}

/// POST /api/admin/refresh
///
/// Runs a refresh and waits for it. 401 without a valid `x-admin-token`,
/// 202 when a refresh is already running, 500 when the merged snapshot could
/// not be rebuilt, 200 otherwise (including partial failures, which are
/// listed in the report).
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let response = match state.catalogue.refresh().await {
        RefreshOutcome::InProgress => (
            StatusCode::ACCEPTED,
            Json(json!({
                "status": "in_progress",
                "message": "A refresh is already in progress"
            })),
        )
            .into_response(),
        RefreshOutcome::Finished(report) if report.error.is_some() => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "report": report })),
        )
            .into_response(),
        RefreshOutcome::Finished(report) => {
            let status = if report.any_failed { "partial" } else { "ok" };
            (StatusCode::OK, Json(json!({ "status": status, "report": report }))).into_response()
        }
    };

    Ok(response)
}
