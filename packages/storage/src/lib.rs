// ABOUTME: Data layer and persistence for Robodesk
// ABOUTME: SQLite record storages, embedded migrations and the artifact blob store

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use thiserror::Error;

use robodesk_core::{ServiceError, Upstream, ValidationError};

pub mod artifacts;
pub mod clients;
pub mod contracts;
pub mod db;
pub mod deliveries;
pub mod offers;
pub mod profiles;
pub mod reporting;
pub mod subscriptions;
pub mod versions;

pub use artifacts::{ArtifactError, ArtifactResult, ArtifactStore, LocalArtifactStore};
pub use clients::ClientStorage;
pub use contracts::ContractStorage;
pub use db::{DatabaseConfig, MIGRATOR};
pub use deliveries::DeliveryStorage;
pub use offers::{OfferStorage, StageChange};
pub use profiles::ProfileStorage;
pub use reporting::{DueLead, PeriodAggregates, ReportingStorage};
pub use subscriptions::SubscriptionStorage;
pub use versions::{DocumentVersionStorage, NewDocumentVersion};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            StorageError::Conflict(msg) => ServiceError::Conflict(msg),
            StorageError::Precondition(msg) => ServiceError::PreconditionFailed(msg),
            StorageError::Validation(v) => ServiceError::Validation(v),
            other => ServiceError::upstream(Upstream::RecordStore, other.to_string()),
        }
    }
}

/// Map a sqlx error, turning unique-constraint violations into `Conflict`
pub(crate) fn map_write_error(err: sqlx::Error, what: &str) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StorageError::Conflict(format!("{} already exists", what));
        }
    }
    StorageError::Sqlx(err)
}

/// Fixed-width UTC timestamp used for every stored instant
pub fn to_db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_db_timestamp(value: &str, column: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::Database(format!("Invalid {} timestamp: {}", column, value)))
}

pub fn to_db_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_db_date(value: &str, column: &str) -> StorageResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| StorageError::Database(format!("Invalid {} date: {}", column, value)))
}

/// Parse a stored enumeration, reporting the column on failure
pub(crate) fn parse_db_enum<T>(value: &str, column: &str) -> StorageResult<T>
where
    T: std::str::FromStr,
{
    value
        .parse::<T>()
        .map_err(|_| StorageError::Database(format!("Invalid {} value: {}", column, value)))
}
