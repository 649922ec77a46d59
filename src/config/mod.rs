//! Configuration module for the membership backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Identity subject seeded as the first Admin when the users table is empty
    pub bootstrap_admin_subject: Option<String>,
    /// Email for the bootstrap Admin
    pub bootstrap_admin_email: Option<String>,
    /// SMS gateway endpoint; unset disables outbound SMS
    pub sms_gateway_url: Option<String>,
    pub sms_api_key: Option<String>,
    /// Email gateway endpoint; unset disables outbound email
    pub email_gateway_url: Option<String>,
    pub email_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("FLOCK_API_PSK").ok();

        let db_path = env::var("FLOCK_DB_PATH")
            .unwrap_or_else(|_| "./data/flock.sqlite".to_string())
            .into();

        let bind_addr = env::var("FLOCK_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid FLOCK_BIND_ADDR format");

        let log_level = env::var("FLOCK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let bootstrap_admin_subject = env::var("FLOCK_BOOTSTRAP_ADMIN_SUBJECT").ok();
        let bootstrap_admin_email = env::var("FLOCK_BOOTSTRAP_ADMIN_EMAIL").ok();

        let sms_gateway_url = env::var("FLOCK_SMS_GATEWAY_URL").ok();
        let sms_api_key = env::var("FLOCK_SMS_API_KEY").ok();
        let email_gateway_url = env::var("FLOCK_EMAIL_GATEWAY_URL").ok();
        let email_api_key = env::var("FLOCK_EMAIL_API_KEY").ok();

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            bootstrap_admin_subject,
            bootstrap_admin_email,
            sms_gateway_url,
            sms_api_key,
            email_gateway_url,
            email_api_key,
        }
    }
}
