//! Camp model: a named sub-group of the congregation.

use serde::{Deserialize, Serialize};

/// A camp, optionally led by one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camp {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<String>,
    pub created_at: String,
}

/// Request body for creating a camp.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampRequest {
    pub name: String,
    #[serde(default)]
    pub leader_id: Option<String>,
}

/// Request body for updating a camp. Absent fields keep their value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub leader_id: Option<String>,
}
