//! Staff user model and the acting-user capability.
//!
//! A `User` is an authorization identity keyed by the identity provider's
//! subject id. It is distinct from a `Member`: a user may or may not have a
//! member profile, and most members have no user at all.

use serde::{Deserialize, Serialize};

/// Staff role. Deliberately narrower than [`crate::models::MemberRole`] so
/// every branch over it is exhaustive at compile time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Leader,
    Shepherd,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Leader => "Leader",
            UserRole::Shepherd => "Shepherd",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(UserRole::Admin),
            "Leader" => Some(UserRole::Leader),
            "Shepherd" => Some(UserRole::Shepherd),
            _ => None,
        }
    }
}

/// A staff user, keyed by the identity provider's subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camp_id: Option<String>,
    pub created_at: String,
}

/// The capability value passed explicitly into every scope-resolving and
/// mutating operation. There is no ambient current-user lookup; a handler
/// that forgets to resolve one cannot touch member data.
#[derive(Debug, Clone)]
pub struct ActingUser {
    pub user_id: String,
    pub role: UserRole,
    pub camp_id: Option<String>,
}

impl From<&User> for ActingUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            camp_id: user.camp_id.clone(),
        }
    }
}

/// Request body for creating a user (admin only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Identity provider subject id
    pub id: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub camp_id: Option<String>,
}

/// Request body for updating a user. Absent fields keep their value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub camp_id: Option<String>,
}

/// Request body for replacing a leader's campus list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCampusesRequest {
    pub campuses: Vec<String>,
}

/// Request body for assigning a shepherd to a member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignShepherdRequest {
    pub shepherd_id: String,
}

/// A shepherd-to-member assignment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAssignment {
    pub id: String,
    pub member_id: String,
    pub shepherd_id: String,
    pub assigned_at: String,
}
