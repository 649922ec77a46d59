//! Pastoral follow-up model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FollowUpType {
    Call,
    WhatsApp,
    Prayer,
    Visit,
    Other,
}

impl FollowUpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpType::Call => "Call",
            FollowUpType::WhatsApp => "WhatsApp",
            FollowUpType::Prayer => "Prayer",
            FollowUpType::Visit => "Visit",
            FollowUpType::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Call" => Some(FollowUpType::Call),
            "WhatsApp" => Some(FollowUpType::WhatsApp),
            "Prayer" => Some(FollowUpType::Prayer),
            "Visit" => Some(FollowUpType::Visit),
            "Other" => Some(FollowUpType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FollowUpOutcome {
    Reached,
    NoAnswer,
    ScheduledCallback,
}

impl FollowUpOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpOutcome::Reached => "Reached",
            FollowUpOutcome::NoAnswer => "NoAnswer",
            FollowUpOutcome::ScheduledCallback => "ScheduledCallback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Reached" => Some(FollowUpOutcome::Reached),
            "NoAnswer" => Some(FollowUpOutcome::NoAnswer),
            "ScheduledCallback" => Some(FollowUpOutcome::ScheduledCallback),
            _ => None,
        }
    }
}

/// A pastoral contact record.
///
/// A row with a `scheduled_at` and no `completed_at` is a pending reminder;
/// once `scheduled_at` is in the past it is overdue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: String,
    pub member_id: String,
    /// The staff user who made or will make the contact
    pub user_id: String,
    pub follow_up_type: FollowUpType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<FollowUpOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// Request body for recording or scheduling a follow-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowUpRequest {
    pub member_id: String,
    pub follow_up_type: FollowUpType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub outcome: Option<FollowUpOutcome>,
    /// Present for a scheduled reminder; absent for a contact already made
    #[serde(default)]
    pub scheduled_at: Option<String>,
    /// Present when the contact already happened
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Request body for completing a pending follow-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFollowUpRequest {
    #[serde(default)]
    pub outcome: Option<FollowUpOutcome>,
    #[serde(default)]
    pub notes: Option<String>,
}
