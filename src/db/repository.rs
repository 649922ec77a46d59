//! Database repository for CRUD operations.
//!
//! All member reads and writes take an explicit [`ScopeFilter`]; a write
//! against a member outside scope fails with `Forbidden`, never silently.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, Camp, CreateEventRequest, CreateFollowUpRequest,
    CreateMemberRequest, CreateUserRequest, Event, EventType, FollowUp, FollowUpOutcome,
    FollowUpType, Member, MemberAssignment, MemberRole, MemberStatus, SelfServiceUpdateRequest,
    UpdateCampRequest, UpdateEventRequest, UpdateMemberRequest, UpdateUserRequest, User, UserRole,
};
use crate::scope::ScopeFilter;

const MEMBER_COLUMNS: &str = "id, first_name, last_name, email, phone, role, status, category, campus, camp_id, region, residence, birthday, join_date, guardian_name, guardian_phone, profile_picture, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== MEMBER OPERATIONS ====================

    /// List members visible to the given scope.
    pub async fn list_members(&self, scope: &ScopeFilter) -> Result<Vec<Member>, AppError> {
        let members = match scope {
            ScopeFilter::Unrestricted => {
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM members ORDER BY last_name, first_name",
                    MEMBER_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?;
                rows.iter().map(member_from_row).collect()
            }
            ScopeFilter::Camp(camp_id) => {
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM members WHERE camp_id = ? ORDER BY last_name, first_name",
                    MEMBER_COLUMNS
                ))
                .bind(camp_id)
                .fetch_all(&self.pool)
                .await?;
                rows.iter().map(member_from_row).collect()
            }
            ScopeFilter::MemberIds(ids) => {
                let rows = sqlx::query(&format!(
                    "SELECT {} FROM members ORDER BY last_name, first_name",
                    MEMBER_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?;
                rows.iter()
                    .map(member_from_row)
                    .filter(|m| ids.contains(&m.id))
                    .collect()
            }
        };
        Ok(members)
    }

    /// Get a member by ID without scope checks. Internal callers only.
    pub async fn get_member(&self, id: &str) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Get a member by ID, enforcing scope. Distinguishes a missing record
    /// from one the acting user may not see.
    pub async fn get_member_scoped(
        &self,
        scope: &ScopeFilter,
        id: &str,
    ) -> Result<Member, AppError> {
        let member = self
            .get_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

        if !scope.allows(&member) {
            return Err(AppError::Forbidden(format!(
                "Member {} is outside your scope",
                id
            )));
        }
        Ok(member)
    }

    /// Create a new member.
    pub async fn create_member(&self, request: &CreateMemberRequest) -> Result<Member, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO members (id, first_name, last_name, email, phone, role, status, category, campus, camp_id, region, residence, birthday, join_date, guardian_name, guardian_phone, profile_picture, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(request.role.as_str())
        .bind(request.status.as_str())
        .bind(&request.category)
        .bind(&request.campus)
        .bind(&request.camp_id)
        .bind(&request.region)
        .bind(&request.residence)
        .bind(&request.birthday)
        .bind(&now)
        .bind(&request.guardian_name)
        .bind(&request.guardian_phone)
        .bind(&request.profile_picture)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let member = Member {
            id,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            role: request.role,
            status: request.status,
            category: request.category.clone(),
            campus: request.campus.clone(),
            camp_id: request.camp_id.clone(),
            region: request.region.clone(),
            residence: request.residence.clone(),
            birthday: request.birthday.clone(),
            join_date: now.clone(),
            guardian_name: request.guardian_name.clone(),
            guardian_phone: request.guardian_phone.clone(),
            profile_picture: request.profile_picture.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        if member.role.is_staff() {
            self.sync_user_for_role(&member).await?;
        }

        Ok(member)
    }

    /// Update a member, enforcing scope. Role transitions into or out of
    /// Leader/Shepherd sync the corresponding users row.
    pub async fn update_member(
        &self,
        scope: &ScopeFilter,
        id: &str,
        request: &UpdateMemberRequest,
    ) -> Result<Member, AppError> {
        let existing = self.get_member_scoped(scope, id).await?;
        let updated = self.apply_member_update(&existing, request).await?;

        let role_changed = updated.role != existing.role;
        if role_changed && (updated.role.is_staff() || existing.role.is_staff()) {
            self.sync_user_for_role(&updated).await?;
        }

        Ok(updated)
    }

    /// Merge an update request into an existing member and persist it.
    /// Scope enforcement is the caller's responsibility.
    pub async fn apply_member_update(
        &self,
        existing: &Member,
        request: &UpdateMemberRequest,
    ) -> Result<Member, AppError> {
        let now = Utc::now().to_rfc3339();

        let first_name = request.first_name.as_ref().unwrap_or(&existing.first_name);
        let last_name = request.last_name.as_ref().unwrap_or(&existing.last_name);
        let email = request.email.clone().or(existing.email.clone());
        let phone = request.phone.clone().or(existing.phone.clone());
        let role = request.role.unwrap_or(existing.role);
        let status = request.status.unwrap_or(existing.status);
        let category = request.category.clone().or(existing.category.clone());
        let campus = request.campus.clone().or(existing.campus.clone());
        let camp_id = request.camp_id.clone().or(existing.camp_id.clone());
        let region = request.region.clone().or(existing.region.clone());
        let residence = request.residence.clone().or(existing.residence.clone());
        let birthday = request.birthday.clone().or(existing.birthday.clone());
        let guardian_name = request
            .guardian_name
            .clone()
            .or(existing.guardian_name.clone());
        let guardian_phone = request
            .guardian_phone
            .clone()
            .or(existing.guardian_phone.clone());
        let profile_picture = request
            .profile_picture
            .clone()
            .or(existing.profile_picture.clone());

        sqlx::query(
            "UPDATE members SET first_name = ?, last_name = ?, email = ?, phone = ?, role = ?, status = ?, category = ?, campus = ?, camp_id = ?, region = ?, residence = ?, birthday = ?, guardian_name = ?, guardian_phone = ?, profile_picture = ?, updated_at = ? WHERE id = ?"
        )
        .bind(first_name)
        .bind(last_name)
        .bind(&email)
        .bind(&phone)
        .bind(role.as_str())
        .bind(status.as_str())
        .bind(&category)
        .bind(&campus)
        .bind(&camp_id)
        .bind(&region)
        .bind(&residence)
        .bind(&birthday)
        .bind(&guardian_name)
        .bind(&guardian_phone)
        .bind(&profile_picture)
        .bind(&now)
        .bind(&existing.id)
        .execute(&self.pool)
        .await?;

        Ok(Member {
            id: existing.id.clone(),
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            email,
            phone,
            role,
            status,
            category,
            campus,
            camp_id,
            region,
            residence,
            birthday,
            join_date: existing.join_date.clone(),
            guardian_name,
            guardian_phone,
            profile_picture,
            created_at: existing.created_at.clone(),
            updated_at: now,
        })
    }

    /// Delete a member, enforcing scope.
    pub async fn delete_member(&self, scope: &ScopeFilter, id: &str) -> Result<(), AppError> {
        self.get_member_scoped(scope, id).await?;

        sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Bulk delete members by id. Admin-only at the handler layer.
    pub async fn delete_members(&self, ids: &[String]) -> Result<u64, AppError> {
        let mut deleted = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM members WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            deleted += result.rows_affected();
        }
        Ok(deleted)
    }

    pub async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM members WHERE email = ?",
            MEMBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(member_from_row))
    }

    pub async fn find_member_by_phone(&self, phone: &str) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM members WHERE phone = ?",
            MEMBER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(member_from_row))
    }

    // ==================== SELF-SERVICE TOKENS ====================

    /// Store a one-time self-service update token for a member.
    pub async fn issue_update_token(
        &self,
        member_id: &str,
        token: &str,
        expires_at: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE members SET update_token = ?, update_token_expires = ? WHERE id = ?")
            .bind(token)
            .bind(expires_at)
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Find the member holding an unexpired self-service token.
    pub async fn find_member_by_update_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM members WHERE update_token = ? AND update_token_expires > ?",
            MEMBER_COLUMNS
        ))
        .bind(token)
        .bind(now.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(member_from_row))
    }

    /// Apply a member's own contact update and consume the token.
    pub async fn self_service_update(
        &self,
        member: &Member,
        request: &SelfServiceUpdateRequest,
    ) -> Result<Member, AppError> {
        let update = UpdateMemberRequest {
            email: request.email.clone(),
            phone: request.phone.clone(),
            residence: request.residence.clone(),
            guardian_name: request.guardian_name.clone(),
            guardian_phone: request.guardian_phone.clone(),
            profile_picture: request.profile_picture.clone(),
            ..Default::default()
        };
        let updated = self.apply_member_update(member, &update).await?;

        sqlx::query(
            "UPDATE members SET update_token = NULL, update_token_expires = NULL WHERE id = ?",
        )
        .bind(&member.id)
        .execute(&self.pool)
        .await?;

        Ok(updated)
    }

    // ==================== CAMP OPERATIONS ====================

    pub async fn list_camps(&self) -> Result<Vec<Camp>, AppError> {
        let rows = sqlx::query("SELECT id, name, leader_id, created_at FROM camps ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(camp_from_row).collect())
    }

    pub async fn get_camp(&self, id: &str) -> Result<Option<Camp>, AppError> {
        let row = sqlx::query("SELECT id, name, leader_id, created_at FROM camps WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(camp_from_row))
    }

    /// Exact-name lookup used by the importer (names are trimmed upstream).
    pub async fn find_camp_by_name(&self, name: &str) -> Result<Option<Camp>, AppError> {
        let row = sqlx::query("SELECT id, name, leader_id, created_at FROM camps WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(camp_from_row))
    }

    pub async fn create_camp(
        &self,
        name: &str,
        leader_id: Option<&str>,
    ) -> Result<Camp, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO camps (id, name, leader_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(leader_id)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(Camp {
            id,
            name: name.to_string(),
            leader_id: leader_id.map(|l| l.to_string()),
            created_at: now,
        })
    }

    pub async fn update_camp(
        &self,
        id: &str,
        request: &UpdateCampRequest,
    ) -> Result<Camp, AppError> {
        let existing = self
            .get_camp(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Camp {} not found", id)))?;

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let leader_id = request.leader_id.clone().or(existing.leader_id.clone());

        sqlx::query("UPDATE camps SET name = ?, leader_id = ? WHERE id = ?")
            .bind(name)
            .bind(&leader_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Camp {
            id: id.to_string(),
            name: name.clone(),
            leader_id,
            created_at: existing.created_at,
        })
    }

    pub async fn delete_camp(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM camps WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Camp {} not found", id)));
        }
        Ok(())
    }

    /// Point a camp at its leader member. Last writer wins.
    pub async fn set_camp_leader(&self, camp_id: &str, member_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE camps SET leader_id = ? WHERE id = ?")
            .bind(member_id)
            .bind(camp_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== EVENT OPERATIONS ====================

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, event_type, event_date, meeting_url, recurrence, created_at FROM events ORDER BY event_date DESC"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(event_from_row).collect())
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, event_type, event_date, meeting_url, recurrence, created_at FROM events WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(event_from_row))
    }

    pub async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO events (id, title, event_type, event_date, meeting_url, recurrence, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.title)
        .bind(request.event_type.as_str())
        .bind(&request.event_date)
        .bind(&request.meeting_url)
        .bind(&request.recurrence)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Event {
            id,
            title: request.title.clone(),
            event_type: request.event_type,
            event_date: request.event_date.clone(),
            meeting_url: request.meeting_url.clone(),
            recurrence: request.recurrence.clone(),
            created_at: now,
        })
    }

    pub async fn update_event(
        &self,
        id: &str,
        request: &UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let existing = self
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

        let title = request.title.as_ref().unwrap_or(&existing.title);
        let event_type = request.event_type.unwrap_or(existing.event_type);
        let event_date = request.event_date.as_ref().unwrap_or(&existing.event_date);
        let meeting_url = request.meeting_url.clone().or(existing.meeting_url.clone());
        let recurrence = request.recurrence.clone().or(existing.recurrence.clone());

        sqlx::query(
            "UPDATE events SET title = ?, event_type = ?, event_date = ?, meeting_url = ?, recurrence = ? WHERE id = ?"
        )
        .bind(title)
        .bind(event_type.as_str())
        .bind(event_date)
        .bind(&meeting_url)
        .bind(&recurrence)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Event {
            id: id.to_string(),
            title: title.clone(),
            event_type,
            event_date: event_date.clone(),
            meeting_url,
            recurrence,
            created_at: existing.created_at,
        })
    }

    pub async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }

    // ==================== ATTENDANCE OPERATIONS ====================

    /// Upsert one member's attendance at one event.
    pub async fn upsert_attendance(
        &self,
        member_id: &str,
        event_id: &str,
        status: AttendanceStatus,
        notes: Option<&str>,
    ) -> Result<AttendanceRecord, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO attendance_records (id, member_id, event_id, status, notes) VALUES (?, ?, ?, ?, ?) ON CONFLICT(member_id, event_id) DO UPDATE SET status = excluded.status, notes = excluded.notes"
        )
        .bind(&id)
        .bind(member_id)
        .bind(event_id)
        .bind(status.as_str())
        .bind(notes)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, member_id, event_id, status, notes FROM attendance_records WHERE member_id = ? AND event_id = ?"
        )
        .bind(member_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(attendance_from_row(&row))
    }

    pub async fn list_attendance_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, member_id, event_id, status, notes FROM attendance_records WHERE event_id = ?"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(attendance_from_row).collect())
    }

    // ==================== USER OPERATIONS ====================

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, email, role, member_id, camp_id, created_at FROM users ORDER BY email",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, role, member_id, camp_id, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn get_user_by_member(&self, member_id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, role, member_id, camp_id, created_at FROM users WHERE member_id = ?",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, email, role, member_id, camp_id, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&request.id)
        .bind(&request.email)
        .bind(request.role.as_str())
        .bind(&request.member_id)
        .bind(&request.camp_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: request.id.clone(),
            email: request.email.clone(),
            role: request.role,
            member_id: request.member_id.clone(),
            camp_id: request.camp_id.clone(),
            created_at: now,
        })
    }

    pub async fn update_user(
        &self,
        id: &str,
        request: &UpdateUserRequest,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let email = request.email.as_ref().unwrap_or(&existing.email);
        let role = request.role.unwrap_or(existing.role);
        let member_id = request.member_id.clone().or(existing.member_id.clone());
        let camp_id = request.camp_id.clone().or(existing.camp_id.clone());

        sqlx::query("UPDATE users SET email = ?, role = ?, member_id = ?, camp_id = ? WHERE id = ?")
            .bind(email)
            .bind(role.as_str())
            .bind(&member_id)
            .bind(&camp_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(User {
            id: id.to_string(),
            email: email.clone(),
            role,
            member_id,
            camp_id,
            created_at: existing.created_at,
        })
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Keep the users table in step with a member's ministry role: promotion
    /// to Leader/Shepherd upserts exactly one linked user row, demotion
    /// removes it. The external identity hookup happens outside this store.
    pub async fn sync_user_for_role(&self, member: &Member) -> Result<(), AppError> {
        let role = match member.role {
            MemberRole::Leader => UserRole::Leader,
            MemberRole::Shepherd => UserRole::Shepherd,
            MemberRole::Member | MemberRole::NewConvert | MemberRole::Guest => {
                sqlx::query("DELETE FROM users WHERE member_id = ?")
                    .bind(&member.id)
                    .execute(&self.pool)
                    .await?;
                return Ok(());
            }
        };

        match self.get_user_by_member(&member.id).await? {
            Some(user) => {
                sqlx::query("UPDATE users SET role = ?, camp_id = ? WHERE id = ?")
                    .bind(role.as_str())
                    .bind(&member.camp_id)
                    .bind(&user.id)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                let now = Utc::now().to_rfc3339();
                let email = member.email.clone().unwrap_or_default();
                sqlx::query(
                    "INSERT INTO users (id, email, role, member_id, camp_id, created_at) VALUES (?, ?, ?, ?, ?, ?)"
                )
                .bind(&id)
                .bind(&email)
                .bind(role.as_str())
                .bind(&member.id)
                .bind(&member.camp_id)
                .bind(&now)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    // ==================== LEADER CAMPUSES ====================

    /// Replace a leader's campus list.
    pub async fn set_leader_campuses(
        &self,
        user_id: &str,
        campuses: &[String],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM leader_campuses WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        for campus in campuses {
            sqlx::query("INSERT INTO leader_campuses (user_id, campus) VALUES (?, ?)")
                .bind(user_id)
                .bind(campus)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn list_leader_campuses(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let rows =
            sqlx::query("SELECT campus FROM leader_campuses WHERE user_id = ? ORDER BY campus")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(|r| r.get("campus")).collect())
    }

    // ==================== ASSIGNMENT OPERATIONS ====================

    /// Assign a shepherd to a member, replacing any existing assignment.
    pub async fn assign_shepherd(
        &self,
        member_id: &str,
        shepherd_id: &str,
    ) -> Result<MemberAssignment, AppError> {
        sqlx::query("DELETE FROM member_assignments WHERE member_id = ?")
            .bind(member_id)
            .execute(&self.pool)
            .await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO member_assignments (id, member_id, shepherd_id, assigned_at) VALUES (?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(member_id)
        .bind(shepherd_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(MemberAssignment {
            id,
            member_id: member_id.to_string(),
            shepherd_id: shepherd_id.to_string(),
            assigned_at: now,
        })
    }

    /// All member ids assigned to a shepherd.
    pub async fn list_assigned_member_ids(
        &self,
        shepherd_id: &str,
    ) -> Result<HashSet<String>, AppError> {
        let rows = sqlx::query("SELECT member_id FROM member_assignments WHERE shepherd_id = ?")
            .bind(shepherd_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("member_id")).collect())
    }

    // ==================== FOLLOW-UP OPERATIONS ====================

    pub async fn create_follow_up(
        &self,
        user_id: &str,
        request: &CreateFollowUpRequest,
    ) -> Result<FollowUp, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO follow_ups (id, member_id, user_id, follow_up_type, notes, outcome, scheduled_at, completed_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.member_id)
        .bind(user_id)
        .bind(request.follow_up_type.as_str())
        .bind(&request.notes)
        .bind(request.outcome.map(|o| o.as_str()))
        .bind(&request.scheduled_at)
        .bind(&request.completed_at)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(FollowUp {
            id,
            member_id: request.member_id.clone(),
            user_id: user_id.to_string(),
            follow_up_type: request.follow_up_type,
            notes: request.notes.clone(),
            outcome: request.outcome,
            scheduled_at: request.scheduled_at.clone(),
            completed_at: request.completed_at.clone(),
            created_at: now,
        })
    }

    pub async fn list_follow_ups_for_member(
        &self,
        member_id: &str,
    ) -> Result<Vec<FollowUp>, AppError> {
        let rows = sqlx::query(
            "SELECT id, member_id, user_id, follow_up_type, notes, outcome, scheduled_at, completed_at, created_at FROM follow_ups WHERE member_id = ? ORDER BY created_at DESC"
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(follow_up_from_row).collect())
    }

    pub async fn get_follow_up(&self, id: &str) -> Result<Option<FollowUp>, AppError> {
        let row = sqlx::query(
            "SELECT id, member_id, user_id, follow_up_type, notes, outcome, scheduled_at, completed_at, created_at FROM follow_ups WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(follow_up_from_row))
    }

    /// Mark a pending follow-up as completed.
    pub async fn complete_follow_up(
        &self,
        id: &str,
        outcome: Option<FollowUpOutcome>,
        notes: Option<&str>,
    ) -> Result<FollowUp, AppError> {
        let existing = self
            .get_follow_up(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Follow-up {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let outcome = outcome.or(existing.outcome);
        let notes = notes.map(|n| n.to_string()).or(existing.notes.clone());

        sqlx::query("UPDATE follow_ups SET completed_at = ?, outcome = ?, notes = ? WHERE id = ?")
            .bind(&now)
            .bind(outcome.map(|o| o.as_str()))
            .bind(&notes)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(FollowUp {
            completed_at: Some(now),
            outcome,
            notes,
            ..existing
        })
    }

    /// Delete a follow-up. Returns whether a row existed.
    pub async fn delete_follow_up(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM follow_ups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== ATTENTION QUERIES ====================

    /// Active members with no Present attendance at an event since
    /// `attendance_cutoff` and no follow-up completed since `snooze_cutoff`.
    /// Scope filtering and capping happen in the caller.
    pub async fn list_inactive_candidates(
        &self,
        attendance_cutoff: DateTime<Utc>,
        snooze_cutoff: DateTime<Utc>,
    ) -> Result<Vec<Member>, AppError> {
        let rows = sqlx::query(
            r#"SELECT m.id, m.first_name, m.last_name, m.email, m.phone, m.role, m.status,
                      m.category, m.campus, m.camp_id, m.region, m.residence, m.birthday,
                      m.join_date, m.guardian_name, m.guardian_phone, m.profile_picture,
                      m.created_at, m.updated_at
               FROM members m
               WHERE m.status = 'Active'
                 AND m.id NOT IN (
                     SELECT ar.member_id FROM attendance_records ar
                     JOIN events e ON e.id = ar.event_id
                     WHERE ar.status = 'Present' AND e.event_date >= ?
                 )
                 AND m.id NOT IN (
                     SELECT f.member_id FROM follow_ups f
                     WHERE f.completed_at IS NOT NULL AND f.completed_at >= ?
                 )
               ORDER BY m.last_name, m.first_name"#,
        )
        .bind(attendance_cutoff.to_rfc3339())
        .bind(snooze_cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(member_from_row).collect())
    }

    /// Date of a member's most recent Present attendance, if any.
    pub async fn last_present_attendance(
        &self,
        member_id: &str,
    ) -> Result<Option<String>, AppError> {
        let row = sqlx::query(
            r#"SELECT MAX(e.event_date) AS last_date
               FROM attendance_records ar
               JOIN events e ON e.id = ar.event_id
               WHERE ar.member_id = ? AND ar.status = 'Present'"#,
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("last_date"))
    }

    /// All pending follow-ups (scheduled, not completed) with the owning
    /// member's name and camp for scope filtering.
    pub async fn list_pending_follow_ups(&self) -> Result<Vec<PendingFollowUpRow>, AppError> {
        let rows = sqlx::query(
            r#"SELECT f.id, f.member_id, f.user_id, f.follow_up_type, f.notes, f.outcome,
                      f.scheduled_at, f.completed_at, f.created_at,
                      m.first_name, m.last_name, m.camp_id
               FROM follow_ups f
               JOIN members m ON m.id = f.member_id
               WHERE f.scheduled_at IS NOT NULL AND f.completed_at IS NULL
               ORDER BY f.scheduled_at"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PendingFollowUpRow {
                follow_up: follow_up_from_row(row),
                member_first_name: row.get("first_name"),
                member_last_name: row.get("last_name"),
                member_camp_id: row.get("camp_id"),
            })
            .collect())
    }

    // ==================== DASHBOARD QUERIES ====================

    pub async fn count_upcoming_events(&self, now: DateTime<Utc>) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM events WHERE event_date >= ?")
            .bind(now.to_rfc3339())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Attendance marks at events since `cutoff`, with the member's camp so
    /// the caller can scope them.
    pub async fn attendance_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AttendanceStatRow>, AppError> {
        let rows = sqlx::query(
            r#"SELECT ar.status, ar.member_id, m.camp_id
               FROM attendance_records ar
               JOIN events e ON e.id = ar.event_id
               JOIN members m ON m.id = ar.member_id
               WHERE e.event_date >= ?"#,
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let status: String = row.get("status");
                AttendanceStatRow {
                    status: AttendanceStatus::from_str(&status)
                        .unwrap_or(AttendanceStatus::Absent),
                    member_id: row.get("member_id"),
                    member_camp_id: row.get("camp_id"),
                }
            })
            .collect())
    }

    // ==================== IMPORT PROGRESS SLOT ====================

    /// Write the latest progress snapshot. Last write wins; readers poll.
    pub async fn set_progress_slot(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT OR REPLACE INTO import_progress (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_progress_slot(&self, key: &str) -> Result<Option<serde_json::Value>, AppError> {
        let row = sqlx::query("SELECT value FROM import_progress WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let raw: String = row.get("value");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }
}

/// A pending follow-up joined with the owning member's identity.
#[derive(Debug, Clone)]
pub struct PendingFollowUpRow {
    pub follow_up: FollowUp,
    pub member_first_name: String,
    pub member_last_name: String,
    pub member_camp_id: Option<String>,
}

/// One attendance mark with the member's camp, for scoped aggregation.
#[derive(Debug, Clone)]
pub struct AttendanceStatRow {
    pub status: AttendanceStatus,
    pub member_id: String,
    pub member_camp_id: Option<String>,
}

// Helper functions for row conversion

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> Member {
    let role: String = row.get("role");
    let status: String = row.get("status");
    Member {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        role: MemberRole::from_str(&role).unwrap_or(MemberRole::Member),
        status: MemberStatus::from_str(&status).unwrap_or(MemberStatus::Active),
        category: row.get("category"),
        campus: row.get("campus"),
        camp_id: row.get("camp_id"),
        region: row.get("region"),
        residence: row.get("residence"),
        birthday: row.get("birthday"),
        join_date: row.get("join_date"),
        guardian_name: row.get("guardian_name"),
        guardian_phone: row.get("guardian_phone"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn camp_from_row(row: &sqlx::sqlite::SqliteRow) -> Camp {
    Camp {
        id: row.get("id"),
        name: row.get("name"),
        leader_id: row.get("leader_id"),
        created_at: row.get("created_at"),
    }
}

fn event_from_row(row: &sqlx::sqlite::SqliteRow) -> Event {
    let event_type: String = row.get("event_type");
    Event {
        id: row.get("id"),
        title: row.get("title"),
        event_type: EventType::from_str(&event_type).unwrap_or(EventType::Service),
        event_date: row.get("event_date"),
        meeting_url: row.get("meeting_url"),
        recurrence: row.get("recurrence"),
        created_at: row.get("created_at"),
    }
}

fn attendance_from_row(row: &sqlx::sqlite::SqliteRow) -> AttendanceRecord {
    let status: String = row.get("status");
    AttendanceRecord {
        id: row.get("id"),
        member_id: row.get("member_id"),
        event_id: row.get("event_id"),
        status: AttendanceStatus::from_str(&status).unwrap_or(AttendanceStatus::Absent),
        notes: row.get("notes"),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        email: row.get("email"),
        role: UserRole::from_str(&role).unwrap_or(UserRole::Shepherd),
        member_id: row.get("member_id"),
        camp_id: row.get("camp_id"),
        created_at: row.get("created_at"),
    }
}

fn follow_up_from_row(row: &sqlx::sqlite::SqliteRow) -> FollowUp {
    let follow_up_type: String = row.get("follow_up_type");
    let outcome: Option<String> = row.get("outcome");
    FollowUp {
        id: row.get("id"),
        member_id: row.get("member_id"),
        user_id: row.get("user_id"),
        follow_up_type: FollowUpType::from_str(&follow_up_type).unwrap_or(FollowUpType::Other),
        notes: row.get("notes"),
        outcome: outcome.as_deref().and_then(FollowUpOutcome::from_str),
        scheduled_at: row.get("scheduled_at"),
        completed_at: row.get("completed_at"),
        created_at: row.get("created_at"),
    }
}
