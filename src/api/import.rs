//! Spreadsheet import API endpoints.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;

use super::{require_admin, success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::import::{import_from_spreadsheet, ImportResult, PROGRESS_KEY};
use crate::AppState;

/// Request body for an import: the sheet as a 2-D grid of strings, header
/// row separated out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// POST /api/import - Run a spreadsheet import (admin).
pub async fn run_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImportRequest>,
) -> ApiResult<ImportResult> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    tracing::info!(
        "Starting spreadsheet import of {} rows by {}",
        request.rows.len(),
        acting.user_id
    );

    let result = import_from_spreadsheet(&state.repo, request.headers, request.rows).await?;
    success(result)
}

/// GET /api/import/progress - Poll the shared progress slot.
///
/// Returns null until the first import has written a snapshot; readers must
/// tolerate stale state.
pub async fn import_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Option<serde_json::Value>> {
    resolve_acting_user(&state.repo, &headers).await?;
    let progress = state.repo.get_progress_slot(PROGRESS_KEY).await?;
    success(progress)
}
