//! Member model: the pastoral record for a person in the congregation.

use serde::{Deserialize, Serialize};

/// Ministry role of a member. Broader than [`crate::models::UserRole`]:
/// most members never get a login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberRole {
    Leader,
    Shepherd,
    Member,
    NewConvert,
    Guest,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Leader => "Leader",
            MemberRole::Shepherd => "Shepherd",
            MemberRole::Member => "Member",
            MemberRole::NewConvert => "NewConvert",
            MemberRole::Guest => "Guest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Leader" => Some(MemberRole::Leader),
            "Shepherd" => Some(MemberRole::Shepherd),
            "Member" => Some(MemberRole::Member),
            "NewConvert" => Some(MemberRole::NewConvert),
            "Guest" => Some(MemberRole::Guest),
            _ => None,
        }
    }

    /// Roles that carry a staff login.
    pub fn is_staff(&self) -> bool {
        matches!(self, MemberRole::Leader | MemberRole::Shepherd)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberStatus {
    Active,
    Inactive,
    Archived,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "Active",
            MemberStatus::Inactive => "Inactive",
            MemberStatus::Archived => "Archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(MemberStatus::Active),
            "Inactive" => Some(MemberStatus::Inactive),
            "Archived" => Some(MemberStatus::Archived),
            _ => None,
        }
    }
}

/// A member record as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: MemberRole,
    pub status: MemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residence: Option<String>,
    /// ISO date (YYYY-MM-DD)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    pub join_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A member as returned to clients, with the edit capability the acting
/// user holds over it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    pub can_edit: bool,
}

/// Request body for creating a member by staff entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_member_role")]
    pub role: MemberRole,
    #[serde(default = "default_member_status")]
    pub status: MemberStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub camp_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

fn default_member_role() -> MemberRole {
    MemberRole::Member
}

fn default_member_status() -> MemberStatus {
    MemberStatus::Active
}

/// Request body for updating a member. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<MemberRole>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub camp_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Request body for the admin bulk delete.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub member_ids: Vec<String>,
}

/// Contact fields a member may change through the token-gated
/// self-service form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfServiceUpdateRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Response for an issued self-service link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfServiceLink {
    pub token: String,
    pub link: String,
    pub expires_at: String,
}
