//! Flock Membership Backend
//!
//! A production-grade REST backend for a ministry membership dashboard:
//! members, camps, events, attendance, pastoral follow-ups, and role-scoped
//! access, with SQLite persistence.

mod api;
mod attention;
mod auth;
mod config;
mod db;
mod errors;
mod import;
mod messaging;
mod models;
mod scope;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use models::{CreateUserRequest, UserRole};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Flock Membership Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (FLOCK_API_PSK). Authentication is disabled!");
    }
    if config.sms_gateway_url.is_none() {
        tracing::warn!("No SMS gateway configured (FLOCK_SMS_GATEWAY_URL). Outbound SMS disabled.");
    }
    if config.email_gateway_url.is_none() {
        tracing::warn!(
            "No email gateway configured (FLOCK_EMAIL_GATEWAY_URL). Outbound email disabled."
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Seed the bootstrap admin on a fresh instance
    seed_bootstrap_admin(&repo, &config).await?;

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
        http: reqwest::Client::new(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the first Admin user when the users table is empty, so a fresh
/// instance is reachable at all.
async fn seed_bootstrap_admin(
    repo: &Repository,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if repo.count_users().await? > 0 {
        return Ok(());
    }
    let (Some(subject), Some(email)) = (
        config.bootstrap_admin_subject.as_ref(),
        config.bootstrap_admin_email.as_ref(),
    ) else {
        return Ok(());
    };

    repo.create_user(&CreateUserRequest {
        id: subject.clone(),
        email: email.clone(),
        role: UserRole::Admin,
        member_id: None,
        camp_id: None,
    })
    .await?;
    tracing::info!("Seeded bootstrap admin {}", subject);
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Members
        .route("/members", get(api::list_members))
        .route("/members", post(api::create_member))
        .route("/members/bulk-delete", post(api::bulk_delete_members))
        .route("/members/{id}", get(api::get_member))
        .route("/members/{id}", put(api::update_member))
        .route("/members/{id}", delete(api::delete_member))
        .route("/members/{id}/assign", post(api::assign_shepherd))
        .route(
            "/members/{id}/self-service-link",
            post(api::issue_self_service_link),
        )
        .route("/members/{id}/follow-ups", get(api::list_follow_ups))
        // Member self-service (token-gated, no identity subject)
        .route("/self-service/{token}", get(api::self_service_get))
        .route("/self-service/{token}", put(api::self_service_update))
        // Camps
        .route("/camps", get(api::list_camps))
        .route("/camps", post(api::create_camp))
        .route("/camps/{id}", put(api::update_camp))
        .route("/camps/{id}", delete(api::delete_camp))
        // Events and attendance
        .route("/events", get(api::list_events))
        .route("/events", post(api::create_event))
        .route("/events/{id}", get(api::get_event))
        .route("/events/{id}", put(api::update_event))
        .route("/events/{id}", delete(api::delete_event))
        .route("/events/{id}/attendance", put(api::mark_attendance))
        .route("/events/{id}/attendance", get(api::list_attendance))
        // Follow-ups
        .route("/follow-ups", post(api::create_follow_up))
        .route("/follow-ups/{id}/complete", put(api::complete_follow_up))
        // Needs attention
        .route("/attention", get(api::get_attention))
        .route("/attention/dismiss", post(api::dismiss_attention))
        // Import
        .route("/import", post(api::run_import))
        .route("/import/progress", get(api::import_progress))
        // Users
        .route("/users", get(api::list_users))
        .route("/users", post(api::create_user))
        .route("/users/{id}", get(api::get_user))
        .route("/users/{id}", put(api::update_user))
        .route("/users/{id}", delete(api::delete_user))
        .route("/users/{id}/campuses", put(api::set_user_campuses))
        // Messaging
        .route("/messages/sms", post(api::send_member_sms))
        .route("/messages/email", post(api::send_member_email))
        .route("/messages/whatsapp-link", post(api::member_whatsapp_link))
        // Dashboard
        .route("/dashboard", get(api::get_dashboard))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
