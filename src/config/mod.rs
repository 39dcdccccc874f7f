//! Configuration module for the onboarding backend.
//!
//! All configuration is loaded from environment variables with sensible defaults
//! and handed to the application at startup.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use crate::auth::Credential;

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
    /// Operator accounts accepted by the login endpoint
    pub credentials: Vec<Credential>,
    /// Browser origins allowed by CORS; empty means any
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("ONBOARDING_API_PSK")
            .ok()
            .filter(|psk| !psk.is_empty());

        let db_path = env::var("ONBOARDING_DB_PATH")
            .unwrap_or_else(|_| "./data/onboarding.sqlite".to_string())
            .into();

        let bind_addr = env::var("ONBOARDING_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = env::var("ONBOARDING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let credentials = env::var("ONBOARDING_CREDENTIALS")
            .map(|raw| parse_credentials(&raw))
            .unwrap_or_default();

        let allowed_origins = env::var("ONBOARDING_ALLOWED_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            credentials,
            allowed_origins,
        })
    }
}

/// Parse `user:pass,user2:pass2`. Entries without a colon are skipped.
pub fn parse_credentials(raw: &str) -> Vec<Credential> {
    split_list(raw)
        .into_iter()
        .filter_map(|entry| {
            let (username, password) = entry.split_once(':')?;
            let username = username.trim();
            if username.is_empty() {
                return None;
            }
            Some(Credential {
                username: username.to_string(),
                password: password.to_string(),
            })
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
