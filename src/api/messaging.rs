//! Outbound messaging API endpoints.
//!
//! These fire after a human operator decides to reach out; none of them are
//! invoked automatically by the attention deriver.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::resolve_acting_user;
use crate::errors::AppError;
use crate::messaging::{send_email, send_sms, whatsapp_link};
use crate::scope::resolve_scope;
use crate::AppState;

/// Request body for sending an SMS to a member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsRequest {
    pub member_id: String,
    pub message: String,
}

/// POST /api/messages/sms - Send an SMS to a member.
pub async fn send_member_sms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendSmsRequest>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let member = state
        .repo
        .get_member_scoped(&scope, &request.member_id)
        .await?;
    let phone = member
        .phone
        .as_ref()
        .ok_or_else(|| AppError::Validation("Member has no phone number".to_string()))?;

    send_sms(&state.http, &state.config, phone, &request.message).await?;
    success(())
}

/// Request body for sending an email to a member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub member_id: String,
    pub subject: String,
    pub body: String,
}

/// POST /api/messages/email - Send an email to a member.
pub async fn send_member_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendEmailRequest>,
) -> ApiResult<()> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let member = state
        .repo
        .get_member_scoped(&scope, &request.member_id)
        .await?;
    let email = member
        .email
        .as_ref()
        .ok_or_else(|| AppError::Validation("Member has no email address".to_string()))?;

    send_email(
        &state.http,
        &state.config,
        email,
        &request.subject,
        &request.body,
    )
    .await?;
    success(())
}

/// Request body for building a WhatsApp link to a member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppLinkRequest {
    pub member_id: String,
    #[serde(default)]
    pub text: String,
}

/// Response carrying the wa.me link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppLinkResponse {
    pub link: String,
}

/// POST /api/messages/whatsapp-link - Build a wa.me link for a member.
pub async fn member_whatsapp_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<WhatsAppLinkRequest>,
) -> ApiResult<WhatsAppLinkResponse> {
    let acting = resolve_acting_user(&state.repo, &headers).await?;
    let scope = resolve_scope(&state.repo, &acting).await?;

    let member = state
        .repo
        .get_member_scoped(&scope, &request.member_id)
        .await?;
    let phone = member
        .phone
        .as_ref()
        .ok_or_else(|| AppError::Validation("Member has no phone number".to_string()))?;

    success(WhatsAppLinkResponse {
        link: whatsapp_link(phone, &request.text),
    })
}
