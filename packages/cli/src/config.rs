// ABOUTME: Runtime configuration for the robodesk binary
// ABOUTME: Parses environment variables into server, storage, email and job settings

use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use robodesk_api::ServiceSettings;
use robodesk_config::constants::*;
use robodesk_config::{normalize, parse_or};
use robodesk_core::constants::{default_artifact_root, default_database_path};
use robodesk_notifications::email::DEFAULT_EMAIL_API_URL;
use robodesk_storage::DatabaseConfig;

const DEFAULT_PORT: u16 = 4001;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_EMAIL_FROM: &str = "Robodesk <noreply@robodesk.local>";
const DEFAULT_EMAIL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REPORT_CURRENCY: &str = "EUR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Reminder look-ahead must be between 0 and 365 days, got {0}")]
    InvalidLookahead(i64),
    #[error("{0} must be set")]
    MissingVariable(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub database_path: PathBuf,
    pub db_max_connections: u32,
    pub artifact_root: PathBuf,
    pub artifact_public_url: Option<String>,
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub email_timeout: Duration,
    pub reminder_lookahead_days: i64,
    pub report_currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(robodesk_config::env_string)
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| normalize(lookup(name));

        let port = match get(ROBODESK_API_PORT).or_else(|| get(PORT)) {
            Some(raw) => raw.parse::<u16>()?,
            None => DEFAULT_PORT,
        };
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let lookahead_raw = get(ROBODESK_REMINDER_LOOKAHEAD_DAYS);
        let reminder_lookahead_days = parse_or(
            ROBODESK_REMINDER_LOOKAHEAD_DAYS,
            lookahead_raw.as_deref(),
            robodesk_core::REMINDER_LOOKAHEAD_DAYS,
        );
        if !(0..=365).contains(&reminder_lookahead_days) {
            return Err(ConfigError::InvalidLookahead(reminder_lookahead_days));
        }

        let max_connections_raw = get(ROBODESK_DB_MAX_CONNECTIONS);
        let timeout_raw = get(ROBODESK_EMAIL_TIMEOUT_SECS);

        Ok(Config {
            host: get(ROBODESK_API_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cors_origin: get(ROBODESK_CORS_ORIGIN)
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            database_path: get(ROBODESK_DATABASE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            db_max_connections: parse_or(
                ROBODESK_DB_MAX_CONNECTIONS,
                max_connections_raw.as_deref(),
                DEFAULT_DB_MAX_CONNECTIONS,
            )
            .max(1),
            artifact_root: get(ROBODESK_ARTIFACT_ROOT)
                .map(PathBuf::from)
                .unwrap_or_else(default_artifact_root),
            artifact_public_url: get(ROBODESK_ARTIFACT_PUBLIC_URL)
                .map(|url| url.trim_end_matches('/').to_string()),
            email_api_url: get(ROBODESK_EMAIL_API_URL)
                .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            email_api_key: get(ROBODESK_EMAIL_API_KEY),
            email_from: get(ROBODESK_EMAIL_FROM).unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            email_timeout: Duration::from_secs(parse_or(
                ROBODESK_EMAIL_TIMEOUT_SECS,
                timeout_raw.as_deref(),
                DEFAULT_EMAIL_TIMEOUT_SECS,
            )),
            reminder_lookahead_days,
            report_currency: get(ROBODESK_REPORT_CURRENCY)
                .unwrap_or_else(|| DEFAULT_REPORT_CURRENCY.to_string()),
        })
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.database_path.clone(),
            max_connections: self.db_max_connections,
            ..DatabaseConfig::default()
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            sender: self.email_from.clone(),
            reminder_lookahead_days: self.reminder_lookahead_days,
            report_currency: self.report_currency.clone(),
        }
    }

    /// The email API key, required by every command that sends mail
    pub fn email_api_key(&self) -> Result<&str, ConfigError> {
        self.email_api_key
            .as_deref()
            .ok_or(ConfigError::MissingVariable(ROBODESK_EMAIL_API_KEY))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
