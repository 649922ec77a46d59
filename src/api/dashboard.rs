//! Dashboard aggregation endpoint.

use axum::{extract::State, http::HeaderMap};
use chrono::{Duration, Utc};
use serde::Serialize;

use super::{success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::models::MemberStatus;
use crate::scope::resolve_scope;
use crate::AppState;

/// Attendance window used for the recent-attendance rate.
const ATTENDANCE_WINDOW_DAYS: i64 = 28;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampCount {
    pub camp_id: String,
    pub name: String,
    pub count: usize,
}

/// Aggregated counts for the dashboard, all computed over the acting
/// user's scope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_members: usize,
    pub active_members: usize,
    pub inactive_members: usize,
    pub by_camp: Vec<CampCount>,
    pub upcoming_events: i64,
    pub pending_follow_ups: usize,
    /// Share of Present marks among attendance records in the last 4 weeks;
    /// 0 when nothing was marked
    pub recent_attendance_rate: f64,
}

/// GET /api/dashboard - Aggregate counts for the acting user.
pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<DashboardSummary> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;
    let now = Utc::now();

    let members = state.repo.list_members(&scope).await?;
    let total_members = members.len();
    let active_members = members
        .iter()
        .filter(|m| m.status == MemberStatus::Active)
        .count();
    let inactive_members = members
        .iter()
        .filter(|m| m.status == MemberStatus::Inactive)
        .count();

    let camps = state.repo.list_camps().await?;
    let by_camp = camps
        .iter()
        .map(|camp| CampCount {
            camp_id: camp.id.clone(),
            name: camp.name.clone(),
            count: members
                .iter()
                .filter(|m| m.camp_id.as_deref() == Some(camp.id.as_str()))
                .count(),
        })
        .collect();

    let upcoming_events = state.repo.count_upcoming_events(now).await?;

    let pending_follow_ups = state
        .repo
        .list_pending_follow_ups()
        .await?
        .iter()
        .filter(|row| {
            scope.allows_ids(&row.follow_up.member_id, row.member_camp_id.as_deref())
        })
        .count();

    let attendance = state
        .repo
        .attendance_since(now - Duration::days(ATTENDANCE_WINDOW_DAYS))
        .await?;
    let scoped: Vec<_> = attendance
        .iter()
        .filter(|row| scope.allows_ids(&row.member_id, row.member_camp_id.as_deref()))
        .collect();
    let present = scoped
        .iter()
        .filter(|row| row.status == crate::models::AttendanceStatus::Present)
        .count();
    let recent_attendance_rate = if scoped.is_empty() {
        0.0
    } else {
        present as f64 / scoped.len() as f64
    };

    success(DashboardSummary {
        total_members,
        active_members,
        inactive_members,
        by_camp,
        upcoming_events,
        pending_follow_ups,
        recent_attendance_rate,
    })
}
