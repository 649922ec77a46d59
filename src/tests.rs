//! Integration tests for the membership backend.

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::attention::members_needing_attention;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::models::{
    ActingUser, CreateEventRequest, CreateFollowUpRequest, CreateMemberRequest, CreateUserRequest,
    EventType, MemberRole, MemberStatus, UserRole,
};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Arc<Repository>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            api_psk: Some("test-api-key".to_string()),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            bootstrap_admin_subject: None,
            bootstrap_admin_email: None,
            sms_gateway_url: None,
            sms_api_key: None,
            email_gateway_url: None,
            email_api_key: None,
        };

        let state = AppState {
            repo: repo.clone(),
            config: Arc::new(config),
            http: Client::new(),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-api-key", "test-api-key".parse().unwrap());

        TestFixture {
            client: Client::builder().default_headers(headers).build().unwrap(),
            base_url,
            repo,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Seed a staff user directly in the store.
    async fn seed_user(&self, id: &str, role: UserRole, camp_id: Option<&str>) {
        self.repo
            .create_user(&CreateUserRequest {
                id: id.to_string(),
                email: format!("{}@flock.test", id),
                role,
                member_id: None,
                camp_id: camp_id.map(|c| c.to_string()),
            })
            .await
            .expect("Failed to seed user");
    }

    fn get_as(&self, path: &str, subject: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("x-identity-subject", subject)
    }

    fn post_as(&self, path: &str, subject: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("x-identity-subject", subject)
    }

    fn put_as(&self, path: &str, subject: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("x-identity-subject", subject)
    }

    fn delete_as(&self, path: &str, subject: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("x-identity-subject", subject)
    }
}

fn admin_acting() -> ActingUser {
    ActingUser {
        user_id: "admin".to_string(),
        role: UserRole::Admin,
        camp_id: None,
    }
}

fn member_request(first: &str, last: &str) -> CreateMemberRequest {
    CreateMemberRequest {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: None,
        phone: None,
        role: MemberRole::Member,
        status: MemberStatus::Active,
        category: None,
        campus: None,
        camp_id: None,
        region: None,
        residence: None,
        birthday: None,
        guardian_name: None,
        guardian_phone: None,
        profile_picture: None,
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Client without the PSK header
    let resp = Client::new()
        .get(fixture.url("/api/members"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_identity_subject() {
    let fixture = TestFixture::new().await;

    // Valid PSK but no identity subject
    let resp = fixture
        .client
        .get(fixture.url("/api/members"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Valid PSK but unknown subject
    let resp = fixture
        .get_as("/api/members", "nobody")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_member_crud() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    // Create member
    let create_resp = fixture
        .post_as("/api/members", "admin")
        .json(&json!({
            "firstName": "Ama",
            "lastName": "Mensah",
            "email": "ama@example.com",
            "phone": "0551112222"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(create_body["success"], true);
    let member_id = create_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(create_body["data"]["firstName"], "Ama");
    assert_eq!(create_body["data"]["role"], "Member");
    assert_eq!(create_body["data"]["status"], "Active");

    // Get member; an admin can always edit
    let get_resp = fixture
        .get_as(&format!("/api/members/{}", member_id), "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["firstName"], "Ama");
    assert_eq!(get_body["data"]["canEdit"], true);

    // Update member
    let update_resp = fixture
        .put_as(&format!("/api/members/{}", member_id), "admin")
        .json(&json!({ "lastName": "Mensah-Boateng" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["lastName"], "Mensah-Boateng");
    assert_eq!(update_body["data"]["firstName"], "Ama");

    // List members
    let list_resp = fixture.get_as("/api/members", "admin").send().await.unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    // Delete member
    let delete_resp = fixture
        .delete_as(&format!("/api/members/{}", member_id), "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // Verify deleted
    let get_deleted = fixture
        .get_as(&format!("/api/members/{}", member_id), "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_leader_scope_limited_to_camp() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    // Two camps with one member each
    let camp_a = fixture
        .repo
        .create_camp("Camp A", None)
        .await
        .unwrap();
    let camp_b = fixture
        .repo
        .create_camp("Camp B", None)
        .await
        .unwrap();

    let mut in_a = member_request("Abena", "Asante");
    in_a.camp_id = Some(camp_a.id.clone());
    let member_a = fixture.repo.create_member(&in_a).await.unwrap();

    let mut in_b = member_request("Kojo", "Owusu");
    in_b.camp_id = Some(camp_b.id.clone());
    let member_b = fixture.repo.create_member(&in_b).await.unwrap();

    fixture
        .seed_user("leader-a", UserRole::Leader, Some(&camp_a.id))
        .await;

    // Leader of camp A sees exactly camp A's members
    let list_resp = fixture
        .get_as("/api/members", "leader-a")
        .send()
        .await
        .unwrap();
    let list_body: Value = list_resp.json().await.unwrap();
    let listed = list_body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], member_a.id.as_str());
    assert_eq!(listed[0]["canEdit"], true);

    // Reading the other camp's member is forbidden, not not-found
    let get_resp = fixture
        .get_as(&format!("/api/members/{}", member_b.id), "leader-a")
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 403);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["error"]["code"], "FORBIDDEN");

    // Writing the other camp's member fails too, never a silent no-op
    let update_resp = fixture
        .put_as(&format!("/api/members/{}", member_b.id), "leader-a")
        .json(&json!({ "firstName": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 403);
    let unchanged = fixture.repo.get_member(&member_b.id).await.unwrap().unwrap();
    assert_eq!(unchanged.first_name, "Kojo");

    // A genuinely missing member is a 404, distinguishable from 403
    let missing_resp = fixture
        .get_as("/api/members/no-such-id", "leader-a")
        .send()
        .await
        .unwrap();
    assert_eq!(missing_resp.status(), 404);
}

#[tokio::test]
async fn test_leader_without_camp_sees_nothing() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;
    fixture.seed_user("floating-leader", UserRole::Leader, None).await;

    fixture
        .repo
        .create_member(&member_request("Yaw", "Boadu"))
        .await
        .unwrap();

    let list_resp = fixture
        .get_as("/api/members", "floating-leader")
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_shepherd_scope_follows_assignments() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;
    fixture.seed_user("shep", UserRole::Shepherd, None).await;

    let assigned = fixture
        .repo
        .create_member(&member_request("Esi", "Appiah"))
        .await
        .unwrap();
    let unassigned = fixture
        .repo
        .create_member(&member_request("Kwame", "Darko"))
        .await
        .unwrap();

    // Before any assignment the shepherd sees nothing
    let empty_resp = fixture.get_as("/api/members", "shep").send().await.unwrap();
    let empty_body: Value = empty_resp.json().await.unwrap();
    assert_eq!(empty_body["data"].as_array().unwrap().len(), 0);

    // Admin assigns one member
    let assign_resp = fixture
        .post_as(&format!("/api/members/{}/assign", assigned.id), "admin")
        .json(&json!({ "shepherdId": "shep" }))
        .send()
        .await
        .unwrap();
    assert_eq!(assign_resp.status(), 200);

    // Member visible iff an assignment row exists
    let list_resp = fixture.get_as("/api/members", "shep").send().await.unwrap();
    let list_body: Value = list_resp.json().await.unwrap();
    let listed = list_body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], assigned.id.as_str());

    let forbidden_resp = fixture
        .get_as(&format!("/api/members/{}", unassigned.id), "shep")
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden_resp.status(), 403);

    // Assigning to a non-shepherd user is a validation error
    let bad_assign = fixture
        .post_as(&format!("/api/members/{}/assign", assigned.id), "admin")
        .json(&json!({ "shepherdId": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_assign.status(), 400);
}

#[tokio::test]
async fn test_role_promotion_syncs_user_row() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let create_resp = fixture
        .post_as("/api/members", "admin")
        .json(&json!({
            "firstName": "Akosua",
            "lastName": "Frimpong",
            "email": "akosua@example.com"
        }))
        .send()
        .await
        .unwrap();
    let create_body: Value = create_resp.json().await.unwrap();
    let member_id = create_body["data"]["id"].as_str().unwrap().to_string();

    // No user row for a plain member
    assert!(fixture
        .repo
        .get_user_by_member(&member_id)
        .await
        .unwrap()
        .is_none());

    // Promote to Shepherd: exactly one linked user row appears
    fixture
        .put_as(&format!("/api/members/{}", member_id), "admin")
        .json(&json!({ "role": "Shepherd" }))
        .send()
        .await
        .unwrap();
    let user = fixture
        .repo
        .get_user_by_member(&member_id)
        .await
        .unwrap()
        .expect("promotion should create a user row");
    assert_eq!(user.role, UserRole::Shepherd);
    assert_eq!(user.email, "akosua@example.com");

    // Promote again to Leader: the same row is updated, not duplicated
    fixture
        .put_as(&format!("/api/members/{}", member_id), "admin")
        .json(&json!({ "role": "Leader" }))
        .send()
        .await
        .unwrap();
    let user = fixture
        .repo
        .get_user_by_member(&member_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, UserRole::Leader);

    // Demote: the user row is removed
    fixture
        .put_as(&format!("/api/members/{}", member_id), "admin")
        .json(&json!({ "role": "Member" }))
        .send()
        .await
        .unwrap();
    assert!(fixture
        .repo
        .get_user_by_member(&member_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_import_end_to_end_and_idempotence() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let body = json!({
        "headers": ["First Name", "Surname", "Contact", "Email", "Camp", "Member Type"],
        "rows": [
            ["Kofi", "Adjei", "055-111 2233", "kofi@example.com", "Camp 1", "Member"],
            ["Adwoa", "Badu", "055 444 5566", "adwoa@example.com", "Camp 1", "New Convert"],
            ["Nana", "Osei", "0557778899", "nana@example.com", "Camp 2 Leader", ""],
            ["", "", "", "", "", ""]
        ]
    });

    let import_resp = fixture
        .post_as("/api/import", "admin")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(import_resp.status(), 200);
    let import_body: Value = import_resp.json().await.unwrap();
    let result = &import_body["data"];
    assert_eq!(result["success"], true);
    assert_eq!(result["syncedCount"], 3);
    assert_eq!(result["skippedCount"], 1);
    assert_eq!(result["errorCount"], 0);
    assert_eq!(result["columnMapping"]["firstName"], 0);
    assert_eq!(result["columnMapping"]["lastName"], 1);
    assert_eq!(result["columnMapping"]["phone"], 2);
    assert_eq!(result["columnMapping"]["email"], 3);
    assert_eq!(result["columnMapping"]["camp"], 4);
    assert_eq!(result["columnMapping"]["memberType"], 5);

    // Camps were created once each; "Camp 2 Leader" normalized to "Camp 2"
    let camps = fixture.repo.list_camps().await.unwrap();
    let names: Vec<&str> = camps.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Camp 1", "Camp 2"]);

    // The camp-cell keyword forced the Leader role and camp leadership
    let nana = fixture
        .repo
        .find_member_by_email("nana@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(nana.role, MemberRole::Leader);
    let camp2 = fixture
        .repo
        .find_camp_by_name("Camp 2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(camp2.leader_id.as_deref(), Some(nana.id.as_str()));

    // Phones were normalized
    let kofi = fixture
        .repo
        .find_member_by_email("kofi@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kofi.phone.as_deref(), Some("0551112233"));

    // New Convert classification
    let adwoa = fixture
        .repo
        .find_member_by_email("adwoa@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(adwoa.role, MemberRole::NewConvert);

    // Second run over the same sheet: every row resolves to an update
    let before = fixture
        .repo
        .list_members(&crate::scope::ScopeFilter::Unrestricted)
        .await
        .unwrap()
        .len();
    let rerun_resp = fixture
        .post_as("/api/import", "admin")
        .json(&body)
        .send()
        .await
        .unwrap();
    let rerun_body: Value = rerun_resp.json().await.unwrap();
    assert_eq!(rerun_body["data"]["syncedCount"], 3);
    let after = fixture
        .repo
        .list_members(&crate::scope::ScopeFilter::Unrestricted)
        .await
        .unwrap()
        .len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_import_phone_keyed_update() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let headers = json!(["First Name", "Surname", "Contact", "Camp", "Member Type"]);

    // First import: no email, keyed by phone
    let first = fixture
        .post_as("/api/import", "admin")
        .json(&json!({
            "headers": headers,
            "rows": [["Mary", "Jane", "0551234567", "Camp 2", ""]]
        }))
        .send()
        .await
        .unwrap();
    let first_body: Value = first.json().await.unwrap();
    assert_eq!(first_body["data"]["syncedCount"], 1);

    let mary = fixture
        .repo
        .find_member_by_phone("0551234567")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mary.first_name, "Mary");
    assert_eq!(mary.role, MemberRole::Member);
    assert!(mary.camp_id.is_some());

    // Re-import with a changed surname: matched by phone, updated in place
    let second = fixture
        .post_as("/api/import", "admin")
        .json(&json!({
            "headers": headers,
            "rows": [["Mary", "Jane-Updated", "0551234567", "Camp 2", ""]]
        }))
        .send()
        .await
        .unwrap();
    let second_body: Value = second.json().await.unwrap();
    assert_eq!(second_body["data"]["syncedCount"], 1);

    let members = fixture
        .repo
        .list_members(&crate::scope::ScopeFilter::Unrestricted)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].last_name, "Jane-Updated");
}

#[tokio::test]
async fn test_import_missing_name_columns() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let resp = fixture
        .post_as("/api/import", "admin")
        .json(&json!({
            "headers": ["Contact", "Email"],
            "rows": [["0551234567", "x@example.com"]]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["syncedCount"], 0);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("name"));

    // The progress slot must carry a terminal error status
    let progress_resp = fixture
        .get_as("/api/import/progress", "admin")
        .send()
        .await
        .unwrap();
    let progress_body: Value = progress_resp.json().await.unwrap();
    assert_eq!(progress_body["data"]["status"], "error");
}

#[tokio::test]
async fn test_import_requires_admin() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("shep", UserRole::Shepherd, None).await;

    let resp = fixture
        .post_as("/api/import", "shep")
        .json(&json!({ "headers": ["First Name"], "rows": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_import_progress_reaches_terminal_state() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    // 25 rows exercises the every-10-rows snapshots and the terminal write
    let rows: Vec<Vec<String>> = (0..25)
        .map(|i| {
            vec![
                format!("First{}", i),
                format!("Last{}", i),
                format!("055000{:04}", i),
            ]
        })
        .collect();

    let resp = fixture
        .post_as("/api/import", "admin")
        .json(&json!({
            "headers": ["First Name", "Surname", "Contact"],
            "rows": rows
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["syncedCount"], 25);

    let progress_resp = fixture
        .get_as("/api/import/progress", "admin")
        .send()
        .await
        .unwrap();
    let progress_body: Value = progress_resp.json().await.unwrap();
    assert_eq!(progress_body["data"]["status"], "completed");
    assert_eq!(progress_body["data"]["current"], 25);
    assert_eq!(progress_body["data"]["total"], 25);
}

#[tokio::test]
async fn test_inactive_boundary_at_four_weeks() {
    let fixture = TestFixture::new().await;
    let now = Utc::now();

    let member = fixture
        .repo
        .create_member(&member_request("Afia", "Nyarko"))
        .await
        .unwrap();

    // Present attendance at an event 29 days ago: inactive
    let old_event = fixture
        .repo
        .create_event(&CreateEventRequest {
            title: "Old Service".to_string(),
            event_type: EventType::Service,
            event_date: (now - Duration::days(29)).to_rfc3339(),
            meeting_url: None,
            recurrence: None,
        })
        .await
        .unwrap();
    fixture
        .repo
        .upsert_attendance(
            &member.id,
            &old_event.id,
            crate::models::AttendanceStatus::Present,
            None,
        )
        .await
        .unwrap();

    let items = members_needing_attention(&fixture.repo, &admin_acting(), now)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].member_id, member.id);
    assert_eq!(items[0].days_overdue, Some(29));

    // Present attendance exactly 28 days ago: inside the window, no alert
    let boundary_event = fixture
        .repo
        .create_event(&CreateEventRequest {
            title: "Boundary Service".to_string(),
            event_type: EventType::Service,
            event_date: (now - Duration::days(28)).to_rfc3339(),
            meeting_url: None,
            recurrence: None,
        })
        .await
        .unwrap();
    fixture
        .repo
        .upsert_attendance(
            &member.id,
            &boundary_event.id,
            crate::models::AttendanceStatus::Present,
            None,
        )
        .await
        .unwrap();

    let items = members_needing_attention(&fixture.repo, &admin_acting(), now)
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_never_attended_member_has_no_last_seen() {
    let fixture = TestFixture::new().await;
    let now = Utc::now();

    let member = fixture
        .repo
        .create_member(&member_request("Kwabena", "Ofori"))
        .await
        .unwrap();

    let items = members_needing_attention(&fixture.repo, &admin_acting(), now)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].member_id, member.id);
    assert_eq!(items[0].days_overdue, None);
}

#[tokio::test]
async fn test_recent_contact_snoozes_inactivity() {
    let fixture = TestFixture::new().await;
    let now = Utc::now();

    let member = fixture
        .repo
        .create_member(&member_request("Efua", "Antwi"))
        .await
        .unwrap();

    // A follow-up completed 6 days ago suppresses the alert
    fixture
        .repo
        .create_follow_up(
            "admin",
            &CreateFollowUpRequest {
                member_id: member.id.clone(),
                follow_up_type: crate::models::FollowUpType::Call,
                notes: None,
                outcome: Some(crate::models::FollowUpOutcome::Reached),
                scheduled_at: None,
                completed_at: Some((now - Duration::days(6)).to_rfc3339()),
            },
        )
        .await
        .unwrap();

    let items = members_needing_attention(&fixture.repo, &admin_acting(), now)
        .await
        .unwrap();
    assert!(items.is_empty());

    // Eight days later the snooze has lapsed and the alert returns
    let later = now + Duration::days(8);
    let items = members_needing_attention(&fixture.repo, &admin_acting(), later)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].member_id, member.id);
}

#[tokio::test]
async fn test_dismiss_inactive_inserts_reached_follow_up() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let member = fixture
        .repo
        .create_member(&member_request("Yaa", "Asantewaa"))
        .await
        .unwrap();

    // The never-attended member shows up as inactive
    let attention_resp = fixture.get_as("/api/attention", "admin").send().await.unwrap();
    let attention_body: Value = attention_resp.json().await.unwrap();
    let items = attention_body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "inactive");
    assert_eq!(items[0]["referenceId"], member.id.as_str());

    // Dismiss it
    let dismiss_resp = fixture
        .post_as("/api/attention/dismiss", "admin")
        .json(&json!({ "type": "inactive", "referenceId": member.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(dismiss_resp.status(), 200);

    // One completed Reached follow-up attributed to the acting user
    let follow_ups = fixture
        .repo
        .list_follow_ups_for_member(&member.id)
        .await
        .unwrap();
    assert_eq!(follow_ups.len(), 1);
    assert_eq!(
        follow_ups[0].outcome,
        Some(crate::models::FollowUpOutcome::Reached)
    );
    assert!(follow_ups[0].completed_at.is_some());
    assert_eq!(follow_ups[0].user_id, "admin");

    // The snooze suppresses the alert on the next computation
    let attention_resp = fixture.get_as("/api/attention", "admin").send().await.unwrap();
    let attention_body: Value = attention_resp.json().await.unwrap();
    assert_eq!(attention_body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dismiss_overdue_deletes_follow_up() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let member = fixture
        .repo
        .create_member(&member_request("Kweku", "Ananse"))
        .await
        .unwrap();

    // Schedule a follow-up in the past
    let create_resp = fixture
        .post_as("/api/follow-ups", "admin")
        .json(&json!({
            "memberId": member.id,
            "followUpType": "Call",
            "scheduledAt": (Utc::now() - Duration::days(2)).to_rfc3339()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    let follow_up_id = create_body["data"]["id"].as_str().unwrap().to_string();

    // It appears as overdue, keyed by the follow-up id (not the member id)
    let attention_resp = fixture.get_as("/api/attention", "admin").send().await.unwrap();
    let attention_body: Value = attention_resp.json().await.unwrap();
    let overdue: Vec<&Value> = attention_body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|i| i["type"] == "overdue")
        .collect();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["referenceId"], follow_up_id.as_str());
    assert_eq!(overdue[0]["memberId"], member.id.as_str());
    assert_eq!(overdue[0]["daysOverdue"], 2);

    // Dismiss deletes the row outright
    let dismiss_resp = fixture
        .post_as("/api/attention/dismiss", "admin")
        .json(&json!({ "type": "overdue", "referenceId": follow_up_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(dismiss_resp.status(), 200);
    assert!(fixture
        .repo
        .get_follow_up(&follow_up_id)
        .await
        .unwrap()
        .is_none());

    // Dismissing the same id again is not-found, not a crash
    let second_resp = fixture
        .post_as("/api/attention/dismiss", "admin")
        .json(&json!({ "type": "overdue", "referenceId": follow_up_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(second_resp.status(), 404);
}

#[tokio::test]
async fn test_dismiss_invalid_type() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let resp = fixture
        .post_as("/api/attention/dismiss", "admin")
        .json(&json!({ "type": "snoozed", "referenceId": "whatever" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_attention_is_scope_filtered() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let camp = fixture.repo.create_camp("Camp X", None).await.unwrap();
    fixture
        .seed_user("leader-x", UserRole::Leader, Some(&camp.id))
        .await;

    // One member inside the leader's camp, one outside; both never attended
    let mut inside = member_request("Ato", "Quartey");
    inside.camp_id = Some(camp.id.clone());
    let inside = fixture.repo.create_member(&inside).await.unwrap();
    fixture
        .repo
        .create_member(&member_request("Fiifi", "Hammond"))
        .await
        .unwrap();

    let resp = fixture.get_as("/api/attention", "leader-x").send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["memberId"], inside.id.as_str());

    // Dismissing a member outside scope is forbidden
    let outside_items = fixture.get_as("/api/attention", "admin").send().await.unwrap();
    let outside_body: Value = outside_items.json().await.unwrap();
    let outsider = outside_body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["memberId"] != inside.id.as_str())
        .unwrap()["memberId"]
        .as_str()
        .unwrap()
        .to_string();
    let dismiss_resp = fixture
        .post_as("/api/attention/dismiss", "leader-x")
        .json(&json!({ "type": "inactive", "referenceId": outsider }))
        .send()
        .await
        .unwrap();
    assert_eq!(dismiss_resp.status(), 403);
}

#[tokio::test]
async fn test_attendance_upsert_is_unique_per_member_event() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let member = fixture
        .repo
        .create_member(&member_request("Nii", "Armah"))
        .await
        .unwrap();
    let event = fixture
        .repo
        .create_event(&CreateEventRequest {
            title: "Midweek Meeting".to_string(),
            event_type: EventType::Meeting,
            event_date: Utc::now().to_rfc3339(),
            meeting_url: None,
            recurrence: None,
        })
        .await
        .unwrap();

    // Mark Absent, then re-mark Present: one record, latest status wins
    for status in ["Absent", "Present"] {
        let resp = fixture
            .put_as(&format!("/api/events/{}/attendance", event.id), "admin")
            .json(&json!({
                "records": [{ "memberId": member.id, "status": status }]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let records = fixture
        .repo
        .list_attendance_for_event(&event.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, crate::models::AttendanceStatus::Present);
}

#[tokio::test]
async fn test_camp_and_event_crud() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;
    fixture.seed_user("shep", UserRole::Shepherd, None).await;

    // Camp creation is admin-only
    let forbidden = fixture
        .post_as("/api/camps", "shep")
        .json(&json!({ "name": "Camp Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let create_resp = fixture
        .post_as("/api/camps", "admin")
        .json(&json!({ "name": "Camp Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let camp_body: Value = create_resp.json().await.unwrap();
    let camp_id = camp_body["data"]["id"].as_str().unwrap().to_string();

    let update_resp = fixture
        .put_as(&format!("/api/camps/{}", camp_id), "admin")
        .json(&json!({ "name": "Camp Z Renamed" }))
        .send()
        .await
        .unwrap();
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["name"], "Camp Z Renamed");

    // Event CRUD
    let event_resp = fixture
        .post_as("/api/events", "admin")
        .json(&json!({
            "title": "Annual Retreat",
            "eventType": "Retreat",
            "eventDate": (Utc::now() + Duration::days(30)).to_rfc3339(),
            "meetingUrl": "https://meet.example.com/retreat"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(event_resp.status(), 200);
    let event_body: Value = event_resp.json().await.unwrap();
    let event_id = event_body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(event_body["data"]["eventType"], "Retreat");

    let delete_resp = fixture
        .delete_as(&format!("/api/events/{}", event_id), "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let get_deleted = fixture
        .get_as(&format!("/api/events/{}", event_id), "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_messaging_validation_and_whatsapp_link() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let no_phone = fixture
        .repo
        .create_member(&member_request("Ekow", "Blankson"))
        .await
        .unwrap();
    let mut with_phone = member_request("Aba", "Quansah");
    with_phone.phone = Some("+233551234567".to_string());
    let with_phone = fixture.repo.create_member(&with_phone).await.unwrap();

    // SMS to a member without a phone is a validation error
    let sms_resp = fixture
        .post_as("/api/messages/sms", "admin")
        .json(&json!({ "memberId": no_phone.id, "message": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(sms_resp.status(), 400);
    let sms_body: Value = sms_resp.json().await.unwrap();
    assert_eq!(sms_body["error"]["code"], "VALIDATION_ERROR");

    // SMS with no gateway configured is a gateway failure, not a crash
    let sms_resp = fixture
        .post_as("/api/messages/sms", "admin")
        .json(&json!({ "memberId": with_phone.id, "message": "Hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(sms_resp.status(), 502);

    // WhatsApp link building needs no gateway
    let link_resp = fixture
        .post_as("/api/messages/whatsapp-link", "admin")
        .json(&json!({ "memberId": with_phone.id, "text": "God bless you" }))
        .send()
        .await
        .unwrap();
    assert_eq!(link_resp.status(), 200);
    let link_body: Value = link_resp.json().await.unwrap();
    assert_eq!(
        link_body["data"]["link"],
        "https://wa.me/233551234567?text=God%20bless%20you"
    );
}

#[tokio::test]
async fn test_self_service_token_flow() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let member = fixture
        .repo
        .create_member(&member_request("Araba", "Koomson"))
        .await
        .unwrap();

    // Staff issues a link
    let issue_resp = fixture
        .post_as(
            &format!("/api/members/{}/self-service-link", member.id),
            "admin",
        )
        .send()
        .await
        .unwrap();
    assert_eq!(issue_resp.status(), 200);
    let issue_body: Value = issue_resp.json().await.unwrap();
    let token = issue_body["data"]["token"].as_str().unwrap().to_string();

    // The member reads their own record without an identity subject
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/self-service/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);

    // Update own phone; the token is consumed
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/self-service/{}", token)))
        .json(&json!({ "phone": "0249998877" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["phone"], "0249998877");

    let reuse_resp = fixture
        .client
        .get(fixture.url(&format!("/api/self-service/{}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(reuse_resp.status(), 404);
}

#[tokio::test]
async fn test_bulk_delete_requires_admin() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;
    fixture.seed_user("shep", UserRole::Shepherd, None).await;

    let m1 = fixture
        .repo
        .create_member(&member_request("Kodwo", "Eshun"))
        .await
        .unwrap();
    let m2 = fixture
        .repo
        .create_member(&member_request("Ekua", "Mansa"))
        .await
        .unwrap();

    let forbidden = fixture
        .post_as("/api/members/bulk-delete", "shep")
        .json(&json!({ "memberIds": [m1.id, m2.id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let resp = fixture
        .post_as("/api/members/bulk-delete", "admin")
        .json(&json!({ "memberIds": [m1.id, m2.id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["deleted"], 2);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let fixture = TestFixture::new().await;
    fixture.seed_user("admin", UserRole::Admin, None).await;

    let camp = fixture.repo.create_camp("Camp D", None).await.unwrap();
    let mut active = member_request("Kobby", "Acquah");
    active.camp_id = Some(camp.id.clone());
    fixture.repo.create_member(&active).await.unwrap();

    let mut inactive = member_request("Maame", "Serwaa");
    inactive.status = MemberStatus::Inactive;
    fixture.repo.create_member(&inactive).await.unwrap();

    let resp = fixture.get_as("/api/dashboard", "admin").send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalMembers"], 2);
    assert_eq!(body["data"]["activeMembers"], 1);
    assert_eq!(body["data"]["inactiveMembers"], 1);
    let by_camp = body["data"]["byCamp"].as_array().unwrap();
    assert_eq!(by_camp.len(), 1);
    assert_eq!(by_camp[0]["count"], 1);
}
