//! Event and attendance API endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{require_admin_or_leader, success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, CreateEventRequest, Event, MarkAttendanceRequest, UpdateEventRequest,
};
use crate::scope::resolve_scope;
use crate::AppState;

/// GET /api/events - List all events.
pub async fn list_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<Event>> {
    resolve_acting_user(&state.repo, &headers).await?;
    let events = state.repo.list_events().await?;
    success(events)
}

/// GET /api/events/:id - Get a single event.
pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Event> {
    resolve_acting_user(&state.repo, &headers).await?;
    let event = state
        .repo
        .get_event(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
    success(event)
}

/// POST /api/events - Create an event.
pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<Event> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin_or_leader(&acting)?;

    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Event title is required".to_string()));
    }

    let event = state.repo.create_event(&request).await?;
    success(event)
}

/// PUT /api/events/:id - Update an event.
pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Event> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin_or_leader(&acting)?;

    let event = state.repo.update_event(&id, &request).await?;
    success(event)
}

/// DELETE /api/events/:id - Delete an event.
pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    require_admin_or_leader(&acting)?;

    state.repo.delete_event(&id).await?;
    success(())
}

/// PUT /api/events/:id/attendance - Upsert attendance marks for an event.
///
/// Every member in the batch must be inside the acting user's scope before
/// anything is written.
pub async fn mark_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<MarkAttendanceRequest>,
) -> ApiResult<Vec<AttendanceRecord>> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    state
        .repo
        .get_event(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

    for mark in &request.records {
        state.repo.get_member_scoped(&scope, &mark.member_id).await?;
    }

    let mut records = Vec::with_capacity(request.records.len());
    for mark in &request.records {
        let record = state
            .repo
            .upsert_attendance(&mark.member_id, &id, mark.status, mark.notes.as_deref())
            .await?;
        records.push(record);
    }
    success(records)
}

/// GET /api/events/:id/attendance - List attendance marks for an event.
pub async fn list_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Vec<AttendanceRecord>> {
    resolve_acting_user(&state.repo, &headers).await?;
    let records = state.repo.list_attendance_for_event(&id).await?;
    success(records)
}
