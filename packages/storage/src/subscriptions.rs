// ABOUTME: Report subscription storage using SQLite
// ABOUTME: Lists enabled subscriptions per cadence and records the last successful send

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::{MAX_RECIPIENT_NAME_LEN, SUBSCRIPTION_ID_PREFIX};
use robodesk_core::{
    generate_id, validate_email, validate_length, validate_required, Frequency,
    ReportSubscription, ReportSubscriptionCreateInput,
};

use crate::{parse_db_enum, parse_db_timestamp, to_db_timestamp, StorageError, StorageResult};

pub struct SubscriptionStorage {
    pool: SqlitePool,
}

impl SubscriptionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_subscription(
        &self,
        input: ReportSubscriptionCreateInput,
    ) -> StorageResult<ReportSubscription> {
        validate_required(&input.report_type, "Report type")?;
        validate_email(&input.recipient_email)?;
        if let Some(name) = input.recipient_name.as_deref() {
            validate_length(name, "Recipient name", MAX_RECIPIENT_NAME_LEN)?;
        }

        let subscription_id = generate_id(SUBSCRIPTION_ID_PREFIX);
        debug!(
            "Creating {} subscription {} for {}",
            input.frequency, subscription_id, input.recipient_email
        );

        sqlx::query(
            r#"
            INSERT INTO report_subscriptions (
                id, report_type, recipient_email, recipient_name, frequency,
                enabled, last_sent_at, created_at
            ) VALUES (?, ?, ?, ?, ?, 1, NULL, ?)
            "#,
        )
        .bind(&subscription_id)
        .bind(&input.report_type)
        .bind(input.recipient_email.trim())
        .bind(&input.recipient_name)
        .bind(input.frequency.as_str())
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_subscription(&subscription_id).await
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> StorageResult<ReportSubscription> {
        let row = sqlx::query("SELECT * FROM report_subscriptions WHERE id = ?")
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| {
                StorageError::NotFound(format!("Report subscription {}", subscription_id))
            })?;

        row_to_subscription(&row)
    }

    pub async fn list_subscriptions(&self) -> StorageResult<Vec<ReportSubscription>> {
        let rows = sqlx::query("SELECT * FROM report_subscriptions ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_subscription).collect()
    }

    /// Enabled subscriptions for one cadence, in creation order
    pub async fn list_enabled(&self, frequency: Frequency) -> StorageResult<Vec<ReportSubscription>> {
        debug!("Fetching enabled {} subscriptions", frequency);

        let rows = sqlx::query(
            r#"
            SELECT * FROM report_subscriptions
            WHERE frequency = ? AND enabled = 1
            ORDER BY created_at ASC
            "#,
        )
        .bind(frequency.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_subscription).collect()
    }

    pub async fn set_enabled(
        &self,
        subscription_id: &str,
        enabled: bool,
    ) -> StorageResult<ReportSubscription> {
        let result = sqlx::query("UPDATE report_subscriptions SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(subscription_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Report subscription {}",
                subscription_id
            )));
        }

        self.get_subscription(subscription_id).await
    }

    /// Record a successful dispatch
    pub async fn mark_sent(&self, subscription_id: &str, at: DateTime<Utc>) -> StorageResult<()> {
        debug!("Marking subscription {} sent at {}", subscription_id, at);

        let result = sqlx::query("UPDATE report_subscriptions SET last_sent_at = ? WHERE id = ?")
            .bind(to_db_timestamp(at))
            .bind(subscription_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Report subscription {}",
                subscription_id
            )));
        }

        Ok(())
    }
}

fn row_to_subscription(row: &SqliteRow) -> StorageResult<ReportSubscription> {
    let frequency: String = row.try_get("frequency")?;
    let last_sent_at: Option<String> = row.try_get("last_sent_at")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(ReportSubscription {
        id: row.try_get("id")?,
        report_type: row.try_get("report_type")?,
        recipient_email: row.try_get("recipient_email")?,
        recipient_name: row.try_get("recipient_name")?,
        frequency: parse_db_enum(&frequency, "frequency")?,
        enabled: row.try_get("enabled")?,
        last_sent_at: last_sent_at
            .as_deref()
            .map(|s| parse_db_timestamp(s, "last_sent_at"))
            .transpose()?,
        created_at: parse_db_timestamp(&created_at, "created_at")?,
    })
}
