//! Spreadsheet import.
//!
//! Takes a 2-D grid of string cells with a header row, sniffs out which
//! column holds which field by synonym matching, classifies each row into a
//! role and camp, and upserts members keyed by email or phone. Rows are
//! processed strictly sequentially: a camp created for row N must be visible
//! to row N+1's cache lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CreateMemberRequest, MemberRole, MemberStatus, UpdateMemberRequest};

/// Progress slot key shared with the polling endpoint.
pub const PROGRESS_KEY: &str = "member-import";

/// How often a progress snapshot is written during the row loop.
const PROGRESS_EVERY_ROWS: usize = 10;

const FIRST_NAME_SYNONYMS: &[&str] = &["first name", "firstname"];
const LAST_NAME_SYNONYMS: &[&str] = &["surname", "last name", "lastname"];
const PHONE_SYNONYMS: &[&str] = &["contact", "phone", "mobile", "tel"];
const BIRTHDAY_SYNONYMS: &[&str] = &["date of birth", "birthday", "dob", "birth"];
const EMAIL_SYNONYMS: &[&str] = &["email", "mail"];
const CAMP_SYNONYMS: &[&str] = &["camp"];
const MEMBER_TYPE_SYNONYMS: &[&str] = &["member type", "membertype", "type", "category"];
const REGION_SYNONYMS: &[&str] = &["region"];
const RESIDENCE_SYNONYMS: &[&str] = &["residence", "address", "location"];
const GUARDIAN_SYNONYMS: &[&str] = &["guardian", "parent"];

/// Which header column each target field resolved to. `None` means the
/// sheet has no such column, which is fine for every field except the name
/// pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub phone: Option<usize>,
    pub birthday: Option<usize>,
    pub email: Option<usize>,
    pub camp: Option<usize>,
    pub member_type: Option<usize>,
    pub region: Option<usize>,
    pub residence: Option<usize>,
    pub guardian: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Running,
    Completed,
    Error,
}

/// Snapshot written to the shared progress slot. Readers poll it
/// last-write-wins and must tolerate staleness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
    pub status: ImportStatus,
    pub message: String,
}

/// Final outcome of an import run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub synced_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub message: String,
    pub column_mapping: ColumnMapping,
    pub found_headers: Vec<String>,
}

/// Resolve header columns by case-insensitive substring match.
/// First matching column wins per field.
pub fn resolve_columns(headers: &[String]) -> ColumnMapping {
    ColumnMapping {
        first_name: find_column(headers, FIRST_NAME_SYNONYMS),
        last_name: find_column(headers, LAST_NAME_SYNONYMS),
        phone: find_column(headers, PHONE_SYNONYMS),
        birthday: find_column(headers, BIRTHDAY_SYNONYMS),
        email: find_column(headers, EMAIL_SYNONYMS),
        camp: find_column(headers, CAMP_SYNONYMS),
        member_type: find_column(headers, MEMBER_TYPE_SYNONYMS),
        region: find_column(headers, REGION_SYNONYMS),
        residence: find_column(headers, RESIDENCE_SYNONYMS),
        guardian: find_column(headers, GUARDIAN_SYNONYMS),
    }
}

fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let lowered = header.to_lowercase();
        synonyms.iter().any(|syn| lowered.contains(syn))
    })
}

/// Classify the member-type cell by keyword.
pub fn classify_role(cell: &str) -> MemberRole {
    let lowered = cell.to_lowercase();
    if lowered.contains("new") {
        MemberRole::NewConvert
    } else if lowered.contains("leader") {
        MemberRole::Leader
    } else if lowered.contains("shepherd") {
        MemberRole::Shepherd
    } else if lowered.contains("guest") {
        MemberRole::Guest
    } else {
        // "old" and "member" both mean a regular member, as does anything else
        MemberRole::Member
    }
}

/// Split a camp cell into the camp name proper and a role override.
/// "Camp 3 Leader" names the camp "Camp 3" and forces the Leader role;
/// the override is applied after member-type classification, so it wins.
pub fn split_camp_cell(cell: &str) -> (String, Option<MemberRole>) {
    if let Some(pos) = find_ascii_ci(cell, "leader") {
        let name = strip_range(cell, pos, "leader".len());
        return (name, Some(MemberRole::Leader));
    }
    if let Some(pos) = find_ascii_ci(cell, "shepherd") {
        let name = strip_range(cell, pos, "shepherd".len());
        return (name, Some(MemberRole::Shepherd));
    }
    (cell.trim().to_string(), None)
}

/// ASCII case-insensitive substring search. The needle is ASCII, so a match
/// can only start on a char boundary of the haystack.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

fn strip_range(cell: &str, pos: usize, len: usize) -> String {
    let mut name = String::with_capacity(cell.len());
    name.push_str(&cell[..pos]);
    name.push_str(&cell[pos + len..]);
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip everything but digits and '+' from a phone cell.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// Lenient birthday parsing; unparseable cells drop to None silently.
pub fn parse_birthday(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%d %B %Y",
        "%B %d, %Y",
        "%B %d %Y",
    ];
    for format in FORMATS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    // Full timestamps occasionally show up in exported sheets
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    None
}

/// Run a full import. Per-row failures are counted and the batch continues;
/// only a missing name column pair aborts up front.
pub async fn import_from_spreadsheet(
    repo: &Repository,
    header_row: Vec<String>,
    rows: Vec<Vec<String>>,
) -> Result<ImportResult, AppError> {
    let mapping = resolve_columns(&header_row);

    if mapping.first_name.is_none() && mapping.last_name.is_none() {
        let message =
            "Could not locate a first name or surname column in the sheet header".to_string();
        write_progress(repo, 0, rows.len(), ImportStatus::Error, &message).await;
        return Ok(ImportResult {
            success: false,
            synced_count: 0,
            skipped_count: 0,
            error_count: 0,
            message,
            column_mapping: mapping,
            found_headers: header_row,
        });
    }

    let total = rows.len();
    write_progress(repo, 0, total, ImportStatus::Running, "Import started").await;

    let mut synced_count = 0;
    let mut skipped_count = 0;
    let mut error_count = 0;
    // Camp name -> camp id, so one import run creates each camp at most once
    let mut camp_cache: HashMap<String, String> = HashMap::new();

    for (index, row) in rows.iter().enumerate() {
        let first_name = cell(row, mapping.first_name);
        let last_name = cell(row, mapping.last_name);

        if first_name.is_empty() && last_name.is_empty() {
            skipped_count += 1;
        } else {
            match import_row(repo, &mapping, row, &first_name, &last_name, &mut camp_cache).await {
                Ok(()) => synced_count += 1,
                Err(err) => {
                    tracing::warn!("Import row {} failed: {}", index + 2, err);
                    error_count += 1;
                }
            }
        }

        if (index + 1) % PROGRESS_EVERY_ROWS == 0 {
            write_progress(
                repo,
                index + 1,
                total,
                ImportStatus::Running,
                &format!("Processed {} of {} rows", index + 1, total),
            )
            .await;
        }
    }

    let message = format!(
        "Imported {} members ({} skipped, {} errors)",
        synced_count, skipped_count, error_count
    );
    write_progress(repo, total, total, ImportStatus::Completed, &message).await;

    Ok(ImportResult {
        success: true,
        synced_count,
        skipped_count,
        error_count,
        message,
        column_mapping: mapping,
        found_headers: header_row,
    })
}

async fn import_row(
    repo: &Repository,
    mapping: &ColumnMapping,
    row: &[String],
    first_name: &str,
    last_name: &str,
    camp_cache: &mut HashMap<String, String>,
) -> Result<(), AppError> {
    let mut role = classify_role(&cell(row, mapping.member_type));

    // Camp cell keywords override the member-type classification
    let camp_cell = cell(row, mapping.camp);
    let mut camp_id = None;
    if !camp_cell.is_empty() {
        let (camp_name, role_override) = split_camp_cell(&camp_cell);
        if let Some(forced) = role_override {
            role = forced;
        }
        if !camp_name.is_empty() {
            camp_id = Some(resolve_camp(repo, camp_cache, &camp_name).await?);
        }
    }

    let email = non_empty(cell(row, mapping.email));
    let phone = non_empty(normalize_phone(&cell(row, mapping.phone)));
    let birthday = parse_birthday(&cell(row, mapping.birthday));
    let region = non_empty(cell(row, mapping.region));
    let residence = non_empty(cell(row, mapping.residence));
    let guardian_name = non_empty(cell(row, mapping.guardian));

    let existing = match &email {
        Some(email) => repo.find_member_by_email(email).await?,
        None => None,
    };
    let existing = match existing {
        Some(member) => Some(member),
        None => match &phone {
            Some(phone) => repo.find_member_by_phone(phone).await?,
            None => None,
        },
    };

    let member_id = match existing {
        Some(member) => {
            let update = UpdateMemberRequest {
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
                email: email.clone(),
                phone: phone.clone(),
                role: Some(role),
                camp_id: camp_id.clone(),
                region,
                residence,
                birthday,
                guardian_name,
                ..Default::default()
            };
            let updated = repo.apply_member_update(&member, &update).await?;
            if updated.role != member.role && (updated.role.is_staff() || member.role.is_staff()) {
                repo.sync_user_for_role(&updated).await?;
            }
            updated.id
        }
        None => {
            // Neither email nor phone resolved: nothing to de-duplicate on,
            // so this always inserts
            let create = CreateMemberRequest {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.clone(),
                phone: phone.clone(),
                role,
                status: MemberStatus::Active,
                category: None,
                campus: None,
                camp_id: camp_id.clone(),
                region,
                residence,
                birthday,
                guardian_name,
                guardian_phone: None,
                profile_picture: None,
            };
            repo.create_member(&create).await?.id
        }
    };

    if role == MemberRole::Leader {
        if let Some(camp_id) = &camp_id {
            // Last leader row processed for a camp wins
            repo.set_camp_leader(camp_id, &member_id).await?;
        }
    }

    Ok(())
}

async fn resolve_camp(
    repo: &Repository,
    cache: &mut HashMap<String, String>,
    name: &str,
) -> Result<String, AppError> {
    if let Some(id) = cache.get(name) {
        return Ok(id.clone());
    }
    let camp = match repo.find_camp_by_name(name).await? {
        Some(camp) => camp,
        None => repo.create_camp(name, None).await?,
    };
    cache.insert(name.to_string(), camp.id.clone());
    Ok(camp.id)
}

fn cell(row: &[String], index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Best-effort progress write; a failed snapshot must not kill the batch.
async fn write_progress(
    repo: &Repository,
    current: usize,
    total: usize,
    status: ImportStatus,
    message: &str,
) {
    let progress = ImportProgress {
        current,
        total,
        status,
        message: message.to_string(),
    };
    match serde_json::to_value(&progress) {
        Ok(value) => {
            if let Err(err) = repo.set_progress_slot(PROGRESS_KEY, &value).await {
                tracing::warn!("Failed to write import progress: {}", err);
            }
        }
        Err(err) => tracing::warn!("Failed to serialize import progress: {}", err),
    }
}
