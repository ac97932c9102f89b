// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Robodesk

// Server Configuration
pub const ROBODESK_API_PORT: &str = "ROBODESK_API_PORT";
pub const ROBODESK_API_HOST: &str = "ROBODESK_API_HOST";
pub const PORT: &str = "PORT"; // Legacy

// CORS Configuration
pub const ROBODESK_CORS_ORIGIN: &str = "ROBODESK_CORS_ORIGIN";

// Storage Configuration
pub const ROBODESK_DATABASE_PATH: &str = "ROBODESK_DATABASE_PATH";
pub const ROBODESK_DB_MAX_CONNECTIONS: &str = "ROBODESK_DB_MAX_CONNECTIONS";
pub const ROBODESK_ARTIFACT_ROOT: &str = "ROBODESK_ARTIFACT_ROOT";
pub const ROBODESK_ARTIFACT_PUBLIC_URL: &str = "ROBODESK_ARTIFACT_PUBLIC_URL";

// Email Delivery
pub const ROBODESK_EMAIL_API_URL: &str = "ROBODESK_EMAIL_API_URL";
pub const ROBODESK_EMAIL_API_KEY: &str = "ROBODESK_EMAIL_API_KEY";
pub const ROBODESK_EMAIL_FROM: &str = "ROBODESK_EMAIL_FROM";
pub const ROBODESK_EMAIL_TIMEOUT_SECS: &str = "ROBODESK_EMAIL_TIMEOUT_SECS";

// Scheduled Jobs
pub const ROBODESK_REMINDER_LOOKAHEAD_DAYS: &str = "ROBODESK_REMINDER_LOOKAHEAD_DAYS";
pub const ROBODESK_REPORT_CURRENCY: &str = "ROBODESK_REPORT_CURRENCY";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// System Environment Variables
pub const HOME: &str = "HOME";
