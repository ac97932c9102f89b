// ABOUTME: Email delivery audit storage using SQLite
// ABOUTME: Append-only; one row per successful send of a document version

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::{DELIVERY_ID_PREFIX, MAX_NOTES_LEN};
use robodesk_core::{generate_id, validate_length, DeliveryStatus, EmailDeliveryRecord};

use crate::{parse_db_enum, parse_db_timestamp, to_db_timestamp, StorageError, StorageResult};

pub struct DeliveryStorage {
    pool: SqlitePool,
}

impl DeliveryStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record_delivery(
        &self,
        document_version_id: &str,
        sent_to: &str,
        sent_by: &str,
        status: DeliveryStatus,
        notes: Option<&str>,
    ) -> StorageResult<EmailDeliveryRecord> {
        if let Some(notes) = notes {
            validate_length(notes, "Notes", MAX_NOTES_LEN)?;
        }

        let record = EmailDeliveryRecord {
            id: generate_id(DELIVERY_ID_PREFIX),
            document_version_id: document_version_id.to_string(),
            sent_to: sent_to.to_string(),
            sent_by: sent_by.to_string(),
            status,
            notes: notes.map(str::to_string),
            sent_at: Utc::now(),
        };

        debug!(
            "Recording {} delivery of version {} to {}",
            status.as_str(),
            document_version_id,
            sent_to
        );

        sqlx::query(
            r#"
            INSERT INTO email_delivery_records (
                id, document_version_id, sent_to, sent_by, status, notes, sent_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.document_version_id)
        .bind(&record.sent_to)
        .bind(&record.sent_by)
        .bind(record.status.as_str())
        .bind(&record.notes)
        .bind(to_db_timestamp(record.sent_at))
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(record)
    }

    /// Deliveries of a version, oldest first
    pub async fn list_for_version(
        &self,
        document_version_id: &str,
    ) -> StorageResult<Vec<EmailDeliveryRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM email_delivery_records WHERE document_version_id = ? ORDER BY sent_at ASC",
        )
        .bind(document_version_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_delivery).collect()
    }
}

fn row_to_delivery(row: &SqliteRow) -> StorageResult<EmailDeliveryRecord> {
    let status: String = row.try_get("status")?;
    let sent_at: String = row.try_get("sent_at")?;

    Ok(EmailDeliveryRecord {
        id: row.try_get("id")?,
        document_version_id: row.try_get("document_version_id")?,
        sent_to: row.try_get("sent_to")?,
        sent_by: row.try_get("sent_by")?,
        status: parse_db_enum(&status, "status")?,
        notes: row.try_get("notes")?,
        sent_at: parse_db_timestamp(&sent_at, "sent_at")?,
    })
}
