//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT UNIQUE,
            phone TEXT UNIQUE,
            role TEXT NOT NULL DEFAULT 'Member',
            status TEXT NOT NULL DEFAULT 'Active',
            category TEXT,
            campus TEXT,
            camp_id TEXT,
            region TEXT,
            residence TEXT,
            birthday TEXT,
            join_date TEXT NOT NULL,
            guardian_name TEXT,
            guardian_phone TEXT,
            profile_picture TEXT,
            update_token TEXT,
            update_token_expires TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS camps (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            leader_id TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            event_type TEXT NOT NULL,
            event_date TEXT NOT NULL,
            meeting_url TEXT,
            recurrence TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            id TEXT PRIMARY KEY,
            member_id TEXT NOT NULL,
            event_id TEXT NOT NULL,
            status TEXT NOT NULL,
            notes TEXT,
            UNIQUE(member_id, event_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            member_id TEXT,
            camp_id TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS member_assignments (
            id TEXT PRIMARY KEY,
            member_id TEXT NOT NULL,
            shepherd_id TEXT NOT NULL,
            assigned_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leader_campuses (
            user_id TEXT NOT NULL,
            campus TEXT NOT NULL,
            PRIMARY KEY (user_id, campus)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS follow_ups (
            id TEXT PRIMARY KEY,
            member_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            follow_up_type TEXT NOT NULL,
            notes TEXT,
            outcome TEXT,
            scheduled_at TEXT,
            completed_at TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Shared progress slot for long-running imports, polled last-write-wins
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_progress (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_members_camp_id ON members(camp_id);
        CREATE INDEX IF NOT EXISTS idx_members_status ON members(status);
        CREATE INDEX IF NOT EXISTS idx_attendance_member ON attendance_records(member_id);
        CREATE INDEX IF NOT EXISTS idx_attendance_event ON attendance_records(event_id);
        CREATE INDEX IF NOT EXISTS idx_events_date ON events(event_date);
        CREATE INDEX IF NOT EXISTS idx_assignments_shepherd ON member_assignments(shepherd_id);
        CREATE INDEX IF NOT EXISTS idx_assignments_member ON member_assignments(member_id);
        CREATE INDEX IF NOT EXISTS idx_follow_ups_member ON follow_ups(member_id);
        CREATE INDEX IF NOT EXISTS idx_follow_ups_scheduled ON follow_ups(scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_users_member ON users(member_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
