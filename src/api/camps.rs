//! Camp API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{require_admin, success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::errors::AppError;
use crate::models::{Camp, CreateCampRequest, UpdateCampRequest};
use crate::AppState;

/// GET /api/camps - List all camps.
pub async fn list_camps(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<Camp>> {
    resolve_acting_user(&state.repo, &headers).await?;
    let camps = state.repo.list_camps().await?;
    success(camps)
}

/// POST /api/camps - Create a camp (admin).
pub async fn create_camp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCampRequest>,
) -> ApiResult<Camp> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Camp name is required".to_string()));
    }

    let camp = state
        .repo
        .create_camp(request.name.trim(), request.leader_id.as_deref())
        .await?;
    success(camp)
}

/// PUT /api/camps/:id - Update a camp (admin).
pub async fn update_camp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateCampRequest>,
) -> ApiResult<Camp> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    let camp = state.repo.update_camp(&id, &request).await?;
    success(camp)
}

/// DELETE /api/camps/:id - Delete a camp (admin).
pub async fn delete_camp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    state.repo.delete_camp(&id).await?;
    success(())
}
