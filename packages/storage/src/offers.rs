// ABOUTME: Offer and offer line item storage layer using SQLite
// ABOUTME: CRUD for offers and their line items; stage writes only via the checked transition

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::{LINE_ITEM_ID_PREFIX, OFFER_ID_PREFIX};
use robodesk_core::{
    generate_id, validate_required, LeadStatus, LineItemInput, Offer, OfferCreateInput,
    OfferLineItem, Stage, ValidationError,
};

use crate::{
    map_write_error, parse_db_date, parse_db_enum, parse_db_timestamp, to_db_date,
    to_db_timestamp, StorageError, StorageResult,
};

/// Result of a committed stage transition
#[derive(Debug, Clone)]
pub struct StageChange {
    pub from: Stage,
    pub offer: Offer,
}

pub struct OfferStorage {
    pool: SqlitePool,
}

impl OfferStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== Offers ====================

    /// Create a new offer in the `leads` stage
    pub async fn create_offer(&self, input: OfferCreateInput) -> StorageResult<Offer> {
        validate_required(&input.offer_number, "Offer number")?;
        validate_required(&input.title, "Offer title")?;

        let offer_id = generate_id(OFFER_ID_PREFIX);
        let now = to_db_timestamp(Utc::now());

        debug!(
            "Creating offer: {} ({}) for client: {}",
            offer_id, input.offer_number, input.client_id
        );

        sqlx::query(
            r#"
            INSERT INTO offers (
                id, offer_number, title, stage, lead_status, next_action_date,
                total_price, currency, salesperson_id, client_id, follow_up_notes,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&offer_id)
        .bind(&input.offer_number)
        .bind(&input.title)
        .bind(Stage::Leads.as_str())
        .bind(input.lead_status.map(|s| s.as_str()))
        .bind(input.next_action_date.map(to_db_date))
        .bind(&input.currency)
        .bind(&input.salesperson_id)
        .bind(&input.client_id)
        .bind(&input.follow_up_notes)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("Offer number {}", input.offer_number)))?;

        self.get_offer(&offer_id).await
    }

    /// Get a single offer by ID
    pub async fn get_offer(&self, offer_id: &str) -> StorageResult<Offer> {
        debug!("Fetching offer: {}", offer_id);

        let row = sqlx::query("SELECT * FROM offers WHERE id = ?")
            .bind(offer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Offer {}", offer_id)))?;

        row_to_offer(&row)
    }

    /// Update the follow-up fields shown in reminder digests
    pub async fn update_follow_up(
        &self,
        offer_id: &str,
        lead_status: Option<LeadStatus>,
        next_action_date: Option<chrono::NaiveDate>,
        follow_up_notes: Option<String>,
    ) -> StorageResult<Offer> {
        debug!("Updating follow-up for offer: {}", offer_id);

        let result = sqlx::query(
            r#"
            UPDATE offers
            SET lead_status = ?, next_action_date = ?, follow_up_notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(lead_status.map(|s| s.as_str()))
        .bind(next_action_date.map(to_db_date))
        .bind(&follow_up_notes)
        .bind(to_db_timestamp(Utc::now()))
        .bind(offer_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Offer {}", offer_id)));
        }

        self.get_offer(offer_id).await
    }

    /// Move an offer to `target` in one transaction
    ///
    /// This is the only write to `offers.stage`. Leaving `leads` requires at
    /// least one line item; the count and the update share the transaction.
    pub async fn transition_stage(&self, offer_id: &str, target: Stage) -> StorageResult<StageChange> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM offers WHERE id = ?")
            .bind(offer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Offer {}", offer_id)))?;
        let current = row_to_offer(&row)?;

        if current.stage == Stage::Leads && target != Stage::Leads {
            let line_items: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM offer_line_items WHERE offer_id = ?")
                    .bind(offer_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(StorageError::Sqlx)?;
            if line_items == 0 {
                return Err(StorageError::Precondition(format!(
                    "Offer {} needs at least one line item before leaving leads",
                    current.offer_number
                )));
            }
        }

        sqlx::query("UPDATE offers SET stage = ?, updated_at = ? WHERE id = ?")
            .bind(target.as_str())
            .bind(to_db_timestamp(Utc::now()))
            .bind(offer_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM offers WHERE id = ?")
            .bind(offer_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;
        let offer = row_to_offer(&row)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(StageChange {
            from: current.stage,
            offer,
        })
    }

    // ==================== Line Items ====================

    /// List line items of an offer in display order
    pub async fn list_line_items(&self, offer_id: &str) -> StorageResult<Vec<OfferLineItem>> {
        let rows = sqlx::query(
            "SELECT * FROM offer_line_items WHERE offer_id = ? ORDER BY position ASC, created_at ASC",
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_line_item).collect()
    }

    pub async fn count_line_items(&self, offer_id: &str) -> StorageResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM offer_line_items WHERE offer_id = ?")
            .bind(offer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Append a line item to an offer
    ///
    /// Callers are expected to have checked the offer's stage; see the
    /// pipeline package's line item guard.
    pub async fn insert_line_item(
        &self,
        offer_id: &str,
        input: &LineItemInput,
    ) -> StorageResult<OfferLineItem> {
        validate_required(&input.description, "Line item description")?;
        validate_required(&input.unit, "Line item unit")?;
        if !input.quantity.is_finite() || input.quantity <= 0.0 {
            return Err(ValidationError::NotPositive("Quantity").into());
        }
        if !input.unit_price.is_finite() || input.unit_price < 0.0 {
            return Err(ValidationError::Negative("Unit price").into());
        }

        let item_id = generate_id(LINE_ITEM_ID_PREFIX);
        let now = to_db_timestamp(Utc::now());

        debug!("Adding line item {} to offer: {}", item_id, offer_id);

        let next_position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM offer_line_items WHERE offer_id = ?",
        )
        .bind(offer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO offer_line_items (
                id, offer_id, description, unit, quantity, unit_price, total_price,
                position, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item_id)
        .bind(offer_id)
        .bind(&input.description)
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(input.total_price())
        .bind(next_position)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM offer_line_items WHERE id = ?")
            .bind(&item_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row_to_line_item(&row)
    }

    /// Delete a line item belonging to the given offer
    pub async fn delete_line_item(&self, offer_id: &str, item_id: &str) -> StorageResult<()> {
        debug!("Removing line item {} from offer: {}", item_id, offer_id);

        let result = sqlx::query("DELETE FROM offer_line_items WHERE id = ? AND offer_id = ?")
            .bind(item_id)
            .bind(offer_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Line item {}", item_id)));
        }

        Ok(())
    }

    /// Recompute the offer total from its line items
    pub async fn refresh_total(&self, offer_id: &str) -> StorageResult<f64> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_price), 0.0) FROM offer_line_items WHERE offer_id = ?",
        )
        .bind(offer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        sqlx::query("UPDATE offers SET total_price = ?, updated_at = ? WHERE id = ?")
            .bind(total)
            .bind(to_db_timestamp(Utc::now()))
            .bind(offer_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(total)
    }
}

pub(crate) fn row_to_offer(row: &SqliteRow) -> StorageResult<Offer> {
    let stage: String = row.try_get("stage")?;
    let lead_status: Option<String> = row.try_get("lead_status")?;
    let next_action_date: Option<String> = row.try_get("next_action_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Offer {
        id: row.try_get("id")?,
        offer_number: row.try_get("offer_number")?,
        title: row.try_get("title")?,
        stage: parse_db_enum(&stage, "stage")?,
        lead_status: lead_status
            .as_deref()
            .map(|s| parse_db_enum(s, "lead_status"))
            .transpose()?,
        next_action_date: next_action_date
            .as_deref()
            .map(|s| parse_db_date(s, "next_action_date"))
            .transpose()?,
        total_price: row.try_get("total_price")?,
        currency: row.try_get("currency")?,
        salesperson_id: row.try_get("salesperson_id")?,
        client_id: row.try_get("client_id")?,
        follow_up_notes: row.try_get("follow_up_notes")?,
        created_at: parse_db_timestamp(&created_at, "created_at")?,
        updated_at: parse_db_timestamp(&updated_at, "updated_at")?,
    })
}

fn row_to_line_item(row: &SqliteRow) -> StorageResult<OfferLineItem> {
    let created_at: String = row.try_get("created_at")?;

    Ok(OfferLineItem {
        id: row.try_get("id")?,
        offer_id: row.try_get("offer_id")?,
        description: row.try_get("description")?,
        unit: row.try_get("unit")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        total_price: row.try_get("total_price")?,
        position: row.try_get("position")?,
        created_at: parse_db_timestamp(&created_at, "created_at")?,
    })
}
