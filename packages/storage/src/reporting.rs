// ABOUTME: Read-only queries feeding the reminder and report jobs
// ABOUTME: Due-lead selection and per-window KPI aggregates computed in SQL

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::Offer;

use crate::offers::row_to_offer;
use crate::{to_db_date, to_db_timestamp, StorageError, StorageResult};

/// Lead with a follow-up due, joined with its client for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueLead {
    pub offer: Offer,
    pub client_name: Option<String>,
    pub client_contact: Option<String>,
}

/// KPI figures for one reporting window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodAggregates {
    pub revenue: f64,
    pub won_deals: i64,
    pub offers_created: i64,
    pub new_clients: i64,
    pub active_contracts: i64,
}

pub struct ReportingStorage {
    pool: SqlitePool,
}

impl ReportingStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open leads whose next action date is on or before `until`
    ///
    /// Ordered by next action date, then creation time.
    pub async fn due_leads(&self, until: NaiveDate) -> StorageResult<Vec<DueLead>> {
        debug!("Fetching leads due on or before {}", until);

        let rows = sqlx::query(
            r#"
            SELECT o.*, c.name AS client_name, c.contact_person AS client_contact
            FROM offers o
            LEFT JOIN clients c ON c.id = o.client_id
            WHERE o.stage = 'leads'
              AND o.next_action_date IS NOT NULL
              AND o.next_action_date <= ?
              AND (o.lead_status IS NULL OR o.lead_status NOT IN ('closed_won', 'closed_lost'))
            ORDER BY o.next_action_date ASC, o.created_at ASC
            "#,
        )
        .bind(to_db_date(until))
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter()
            .map(|row| {
                Ok(DueLead {
                    offer: row_to_offer(row)?,
                    client_name: row.try_get("client_name")?,
                    client_contact: row.try_get("client_contact")?,
                })
            })
            .collect()
    }

    /// Aggregate KPIs over records created in `[start, end]`
    pub async fn period_aggregates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<PeriodAggregates> {
        let start = to_db_timestamp(start);
        let end = to_db_timestamp(end);
        debug!("Aggregating report window {} .. {}", start, end);

        let won = sqlx::query(
            r#"
            SELECT COALESCE(SUM(total_price), 0.0) AS revenue, COUNT(*) AS won_deals
            FROM offers
            WHERE stage = 'closed_won' AND created_at >= ? AND created_at <= ?
            "#,
        )
        .bind(&start)
        .bind(&end)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let offers_created: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM offers WHERE created_at >= ? AND created_at <= ?",
        )
        .bind(&start)
        .bind(&end)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let new_clients: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clients WHERE created_at >= ? AND created_at <= ?",
        )
        .bind(&start)
        .bind(&end)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let active_contracts: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM contracts
            WHERE status = 'active' AND created_at >= ? AND created_at <= ?
            "#,
        )
        .bind(&start)
        .bind(&end)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(PeriodAggregates {
            revenue: won.try_get("revenue")?,
            won_deals: won.try_get("won_deals")?,
            offers_created,
            new_clients,
            active_contracts,
        })
    }
}
