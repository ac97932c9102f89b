use std::env;
use std::path::PathBuf;

/// Days past today that still count as "due soon" in the follow-up reminder sweep
pub const REMINDER_LOOKAHEAD_DAYS: i64 = 3;

/// Maximum attempts when two writers race for the same document version number
pub const MAX_VERSION_ALLOCATION_ATTEMPTS: u32 = 3;

/// Longest recipient name accepted for outgoing mail
pub const MAX_RECIPIENT_NAME_LEN: usize = 200;

/// Longest free-text note accepted on versions and deliveries
pub const MAX_NOTES_LEN: usize = 2_000;

/// Longest storage key accepted by the artifact store
pub const MAX_STORAGE_KEY_LEN: usize = 512;

/// Record id prefixes
pub const OFFER_ID_PREFIX: &str = "off";
pub const LINE_ITEM_ID_PREFIX: &str = "li";
pub const CLIENT_ID_PREFIX: &str = "cli";
pub const CONTRACT_ID_PREFIX: &str = "ctr";
pub const PROFILE_ID_PREFIX: &str = "usr";
pub const VERSION_ID_PREFIX: &str = "ver";
pub const DELIVERY_ID_PREFIX: &str = "dlv";
pub const SUBSCRIPTION_ID_PREFIX: &str = "sub";

/// Get the path to the Robodesk data directory (~/.robodesk)
pub fn robodesk_dir() -> PathBuf {
    // HOME first so tests can redirect it
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".robodesk")
    } else {
        dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".robodesk")
    }
}

/// Default SQLite database location (~/.robodesk/robodesk.db)
pub fn default_database_path() -> PathBuf {
    robodesk_dir().join("robodesk.db")
}

/// Default artifact root (~/.robodesk/artifacts)
pub fn default_artifact_root() -> PathBuf {
    robodesk_dir().join("artifacts")
}
