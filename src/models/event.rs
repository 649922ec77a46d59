//! Event and attendance models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventType {
    Service,
    Retreat,
    Meeting,
    Outreach,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Service => "Service",
            EventType::Retreat => "Retreat",
            EventType::Meeting => "Meeting",
            EventType::Outreach => "Outreach",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Service" => Some(EventType::Service),
            "Retreat" => Some(EventType::Retreat),
            "Meeting" => Some(EventType::Meeting),
            "Outreach" => Some(EventType::Outreach),
            _ => None,
        }
    }
}

/// Ternary attendance status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Excused => "Excused",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            "Excused" => Some(AttendanceStatus::Excused),
            _ => None,
        }
    }
}

/// A dated occurrence members can attend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub event_type: EventType,
    /// RFC 3339 timestamp of the occurrence
    pub event_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
    pub created_at: String,
}

/// One member's attendance at one event. Unique per (member, event).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub member_id: String,
    pub event_id: String,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request body for creating an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub event_type: EventType,
    pub event_date: String,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub recurrence: Option<String>,
}

/// Request body for updating an event. Absent fields keep their value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub recurrence: Option<String>,
}

/// One attendance mark inside a marking request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub member_id: String,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for marking attendance at an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub records: Vec<AttendanceMark>,
}
