//! Member API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;

use super::{require_admin, require_admin_or_leader, success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::errors::AppError;
use crate::models::{
    AssignShepherdRequest, BulkDeleteRequest, CreateMemberRequest, Member, MemberAssignment,
    MemberView, SelfServiceLink, SelfServiceUpdateRequest, UpdateMemberRequest, UserRole,
};
use crate::scope::{can_edit, resolve_scope};
use crate::AppState;

/// How long a self-service update link stays valid.
const SELF_SERVICE_TOKEN_DAYS: i64 = 7;

/// GET /api/members - List members visible to the acting user.
pub async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<MemberView>> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let members = state.repo.list_members(&scope).await?;
    let views = members
        .into_iter()
        .map(|member| {
            let editable = can_edit(&scope, &member);
            MemberView {
                member,
                can_edit: editable,
            }
        })
        .collect();
    success(views)
}

/// GET /api/members/:id - Get a single member.
pub async fn get_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<MemberView> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let member = state.repo.get_member_scoped(&scope, &id).await?;
    let editable = can_edit(&scope, &member);
    success(MemberView {
        member,
        can_edit: editable,
    })
}

/// POST /api/members - Create a new member by staff entry.
pub async fn create_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<CreateMemberRequest>,
) -> ApiResult<Member> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin_or_leader(&acting)?;

    if request.first_name.trim().is_empty() && request.last_name.trim().is_empty() {
        return Err(AppError::Validation("A name is required".to_string()));
    }

    // A leader's new members land in their own camp
    if acting.role == UserRole::Leader {
        match &acting.camp_id {
            Some(camp_id) => request.camp_id = Some(camp_id.clone()),
            None => {
                return Err(AppError::Forbidden(
                    "Leader has no camp assignment".to_string(),
                ))
            }
        }
    }

    let member = state.repo.create_member(&request).await?;
    success(member)
}

/// PUT /api/members/:id - Update a member.
pub async fn update_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateMemberRequest>,
) -> ApiResult<Member> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let member = state.repo.update_member(&scope, &id, &request).await?;
    success(member)
}

/// DELETE /api/members/:id - Delete a member. Hard deletes are an admin
/// action; everyone else archives via update.
pub async fn delete_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    state.repo.delete_member(&scope, &id).await?;
    success(())
}

/// Result of a bulk delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub deleted: u64,
}

/// POST /api/members/bulk-delete - Admin bulk delete.
pub async fn bulk_delete_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BulkDeleteRequest>,
) -> ApiResult<BulkDeleteResult> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    let deleted = state.repo.delete_members(&request.member_ids).await?;
    success(BulkDeleteResult { deleted })
}

/// POST /api/members/:id/assign - Assign a shepherd to a member.
pub async fn assign_shepherd(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<AssignShepherdRequest>,
) -> ApiResult<MemberAssignment> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin_or_leader(&acting)?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    state.repo.get_member_scoped(&scope, &id).await?;

    let shepherd = state
        .repo
        .get_user(&request.shepherd_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", request.shepherd_id)))?;
    match shepherd.role {
        UserRole::Shepherd => {}
        UserRole::Admin | UserRole::Leader => {
            return Err(AppError::Validation(format!(
                "User {} is not a shepherd",
                request.shepherd_id
            )))
        }
    }

    let assignment = state.repo.assign_shepherd(&id, &request.shepherd_id).await?;
    success(assignment)
}

/// POST /api/members/:id/self-service-link - Issue a one-time update link.
pub async fn issue_self_service_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<SelfServiceLink> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    state.repo.get_member_scoped(&scope, &id).await?;

    let token = uuid::Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + Duration::days(SELF_SERVICE_TOKEN_DAYS)).to_rfc3339();
    state.repo.issue_update_token(&id, &token, &expires_at).await?;

    success(SelfServiceLink {
        link: format!("/self-service/{}", token),
        token,
        expires_at,
    })
}

/// GET /api/self-service/:token - Read the member behind a valid token.
pub async fn self_service_get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Member> {
    let member = state
        .repo
        .find_member_by_update_token(&token, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid or expired link".to_string()))?;
    success(member)
}

/// PUT /api/self-service/:token - Apply the member's own update and consume
/// the token.
pub async fn self_service_update(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<SelfServiceUpdateRequest>,
) -> ApiResult<Member> {
    let member = state
        .repo
        .find_member_by_update_token(&token, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid or expired link".to_string()))?;

    let updated = state.repo.self_service_update(&member, &request).await?;
    success(updated)
}
