//! Staff user API endpoints. All admin-only.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{require_admin, success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::errors::AppError;
use crate::models::{CreateUserRequest, SetCampusesRequest, UpdateUserRequest, User};
use crate::AppState;

/// GET /api/users - List all staff users.
pub async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<User>> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    let users = state.repo.list_users().await?;
    success(users)
}

/// GET /api/users/:id - Get a single user.
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    let user = state
        .repo
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
    success(user)
}

/// POST /api/users - Create a user.
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<User> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    if request.id.trim().is_empty() {
        return Err(AppError::Validation(
            "An identity subject id is required".to_string(),
        ));
    }
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("An email is required".to_string()));
    }

    let user = state.repo.create_user(&request).await?;
    success(user)
}

/// PUT /api/users/:id - Update a user.
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<User> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    let user = state.repo.update_user(&id, &request).await?;
    success(user)
}

/// DELETE /api/users/:id - Delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    state.repo.delete_user(&id).await?;
    success(())
}

/// PUT /api/users/:id/campuses - Replace a leader's campus list.
pub async fn set_user_campuses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<SetCampusesRequest>,
) -> ApiResult<Vec<String>> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin(&acting)?;

    state
        .repo
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    state.repo.set_leader_campuses(&id, &request.campuses).await?;
    let campuses = state.repo.list_leader_campuses(&id).await?;
    success(campuses)
}
