//! Pastoral attention derivation.
//!
//! Surfaces two independent lists: members who have gone quiet (no Present
//! attendance in the last four weeks, and no recent contact to snooze the
//! alert) and scheduled follow-ups whose time has passed. Both lists apply
//! the acting user's scope and are returned concatenated, inactive first.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{ActingUser, CreateFollowUpRequest, FollowUpOutcome, FollowUpType};
use crate::scope::{resolve_scope, ScopeFilter};

/// No Present attendance within this window marks a member inactive.
const ATTENDANCE_WINDOW_DAYS: i64 = 28;

/// A follow-up completed within this window suppresses the inactivity alert.
const SNOOZE_WINDOW_DAYS: i64 = 7;

/// Fixed page size per list; there is no pagination.
const MAX_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttentionKind {
    Inactive,
    Overdue,
}

/// One alert on the dashboard.
///
/// `reference_id` targets the dismiss action: the member id for an inactive
/// alert, the follow-up id for an overdue one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionItem {
    pub member_id: String,
    #[serde(rename = "type")]
    pub kind: AttentionKind,
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_overdue: Option<i64>,
}

/// Compute the members needing attention for the acting user.
///
/// `now` is passed explicitly so window boundaries are testable.
pub async fn members_needing_attention(
    repo: &Repository,
    acting: &ActingUser,
    now: DateTime<Utc>,
) -> Result<Vec<AttentionItem>, AppError> {
    let scope = resolve_scope(repo, acting).await?;

    let mut items = inactive_items(repo, &scope, now).await?;
    items.extend(overdue_items(repo, &scope, now).await?);
    Ok(items)
}

async fn inactive_items(
    repo: &Repository,
    scope: &ScopeFilter,
    now: DateTime<Utc>,
) -> Result<Vec<AttentionItem>, AppError> {
    let attendance_cutoff = now - Duration::days(ATTENDANCE_WINDOW_DAYS);
    let snooze_cutoff = now - Duration::days(SNOOZE_WINDOW_DAYS);

    let candidates = repo
        .list_inactive_candidates(attendance_cutoff, snooze_cutoff)
        .await?;

    let mut items = Vec::new();
    for member in candidates.iter().filter(|m| scope.allows(m)).take(MAX_ITEMS) {
        // Never-attended members carry no last-seen date
        let days_overdue = match repo.last_present_attendance(&member.id).await? {
            Some(last) => DateTime::parse_from_rfc3339(&last)
                .ok()
                .map(|d| (now - d.with_timezone(&Utc)).num_days()),
            None => None,
        };

        items.push(AttentionItem {
            member_id: member.id.clone(),
            kind: AttentionKind::Inactive,
            reference_id: member.id.clone(),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            reason: "No attendance recorded in the last 4 weeks".to_string(),
            days_overdue,
        });
    }
    Ok(items)
}

async fn overdue_items(
    repo: &Repository,
    scope: &ScopeFilter,
    now: DateTime<Utc>,
) -> Result<Vec<AttentionItem>, AppError> {
    let pending = repo.list_pending_follow_ups().await?;

    let mut items = Vec::new();
    for row in pending {
        if items.len() >= MAX_ITEMS {
            break;
        }
        let Some(scheduled) = row
            .follow_up
            .scheduled_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
        else {
            continue;
        };
        if scheduled >= now {
            continue;
        }
        if !scope.allows_ids(&row.follow_up.member_id, row.member_camp_id.as_deref()) {
            continue;
        }

        let days = (now - scheduled).num_days();
        items.push(AttentionItem {
            member_id: row.follow_up.member_id.clone(),
            kind: AttentionKind::Overdue,
            reference_id: row.follow_up.id.clone(),
            first_name: row.member_first_name.clone(),
            last_name: row.member_last_name.clone(),
            reason: format!(
                "Scheduled {} follow-up is overdue",
                row.follow_up.follow_up_type.as_str()
            ),
            days_overdue: Some(days),
        });
    }
    Ok(items)
}

/// What a dismiss request targets. The wire form overloads `referenceId`
/// (member id for inactive, follow-up id for overdue); parsing it into a
/// tagged union keeps the two meanings from ever sharing a code path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DismissTarget {
    Inactive { member_id: String },
    Overdue { follow_up_id: String },
}

impl DismissTarget {
    pub fn parse(kind: &str, reference_id: &str) -> Result<Self, AppError> {
        match kind {
            "inactive" => Ok(DismissTarget::Inactive {
                member_id: reference_id.to_string(),
            }),
            "overdue" => Ok(DismissTarget::Overdue {
                follow_up_id: reference_id.to_string(),
            }),
            other => Err(AppError::Validation(format!(
                "Invalid action item type: {}",
                other
            ))),
        }
    }
}

/// Dismiss an attention item.
///
/// Overdue: the reminder row is deleted outright. Inactive: a completed
/// follow-up attributed to the acting user is inserted, which snoozes the
/// alert for the next week.
pub async fn dismiss_action_item(
    repo: &Repository,
    acting: &ActingUser,
    target: DismissTarget,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let scope = resolve_scope(repo, acting).await?;

    match target {
        DismissTarget::Overdue { follow_up_id } => {
            let follow_up = repo.get_follow_up(&follow_up_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Follow-up {} not found", follow_up_id))
            })?;
            repo.get_member_scoped(&scope, &follow_up.member_id).await?;
            repo.delete_follow_up(&follow_up_id).await?;
            Ok(())
        }
        DismissTarget::Inactive { member_id } => {
            let member = repo.get_member_scoped(&scope, &member_id).await?;
            let request = CreateFollowUpRequest {
                member_id: member.id.clone(),
                follow_up_type: FollowUpType::Other,
                notes: Some("Inactivity alert dismissed from dashboard".to_string()),
                outcome: Some(FollowUpOutcome::Reached),
                scheduled_at: None,
                completed_at: Some(now.to_rfc3339()),
            };
            repo.create_follow_up(&acting.user_id, &request).await?;
            Ok(())
        }
    }
}
