//! Needs-attention API endpoints.

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Deserialize;

use super::{success, ApiResult};
use crate::attention::{dismiss_action_item, members_needing_attention, AttentionItem, DismissTarget};
use crate::auth::resolve_acting_user;
use crate::AppState;

/// GET /api/attention - Members needing attention for the acting user.
pub async fn get_attention(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<AttentionItem>> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let items = members_needing_attention(&state.repo, &acting, Utc::now()).await?;
    success(items)
}

/// Request body for dismissing an attention item. `referenceId` is the
/// member id for an inactive alert and the follow-up id for an overdue one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub reference_id: String,
}

/// POST /api/attention/dismiss - Dismiss an attention item.
pub async fn dismiss_attention(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DismissRequest>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let target = DismissTarget::parse(&request.kind, &request.reference_id)?;
    dismiss_action_item(&state.repo, &acting, target, Utc::now()).await?;
    success(())
}
