//! Follow-up API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::errors::AppError;
use crate::models::{CompleteFollowUpRequest, CreateFollowUpRequest, FollowUp};
use crate::scope::resolve_scope;
use crate::AppState;

/// POST /api/follow-ups - Record or schedule a follow-up for a member.
pub async fn create_follow_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateFollowUpRequest>,
) -> ApiResult<FollowUp> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    state
        .repo
        .get_member_scoped(&scope, &request.member_id)
        .await?;

    let follow_up = state
        .repo
        .create_follow_up(&acting.user_id, &request)
        .await?;
    success(follow_up)
}

/// GET /api/members/:id/follow-ups - List a member's follow-ups.
pub async fn list_follow_ups(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Vec<FollowUp>> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    state.repo.get_member_scoped(&scope, &id).await?;

    let follow_ups = state.repo.list_follow_ups_for_member(&id).await?;
    success(follow_ups)
}

/// PUT /api/follow-ups/:id/complete - Mark a pending follow-up completed.
pub async fn complete_follow_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CompleteFollowUpRequest>,
) -> ApiResult<FollowUp> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let existing = state
        .repo
        .get_follow_up(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Follow-up {} not found", id)))?;
    state
        .repo
        .get_member_scoped(&scope, &existing.member_id)
        .await?;

    let follow_up = state
        .repo
        .complete_follow_up(&id, request.outcome, request.notes.as_deref())
        .await?;
    success(follow_up)
}
