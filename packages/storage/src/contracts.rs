// ABOUTME: Contract storage layer using SQLite
// ABOUTME: Contracts are rendered into versioned documents and counted as active in reports

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::CONTRACT_ID_PREFIX;
use robodesk_core::{generate_id, validate_required, Contract, ContractCreateInput};

use crate::{
    map_write_error, parse_db_enum, parse_db_timestamp, to_db_timestamp, StorageError,
    StorageResult,
};

pub struct ContractStorage {
    pool: SqlitePool,
}

impl ContractStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_contract(&self, input: ContractCreateInput) -> StorageResult<Contract> {
        validate_required(&input.contract_number, "Contract number")?;
        validate_required(&input.title, "Contract title")?;

        let contract_id = generate_id(CONTRACT_ID_PREFIX);
        debug!(
            "Creating contract: {} ({}) for client: {}",
            contract_id, input.contract_number, input.client_id
        );

        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, contract_number, title, client_id, offer_id, status,
                total_value, currency, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contract_id)
        .bind(&input.contract_number)
        .bind(&input.title)
        .bind(&input.client_id)
        .bind(&input.offer_id)
        .bind(input.status.as_str())
        .bind(input.total_value)
        .bind(&input.currency)
        .bind(&input.notes)
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &format!("Contract number {}", input.contract_number)))?;

        self.get_contract(&contract_id).await
    }

    pub async fn get_contract(&self, contract_id: &str) -> StorageResult<Contract> {
        debug!("Fetching contract: {}", contract_id);

        let row = sqlx::query("SELECT * FROM contracts WHERE id = ?")
            .bind(contract_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Contract {}", contract_id)))?;

        row_to_contract(&row)
    }
}

fn row_to_contract(row: &SqliteRow) -> StorageResult<Contract> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Contract {
        id: row.try_get("id")?,
        contract_number: row.try_get("contract_number")?,
        title: row.try_get("title")?,
        client_id: row.try_get("client_id")?,
        offer_id: row.try_get("offer_id")?,
        status: parse_db_enum(&status, "status")?,
        total_value: row.try_get("total_value")?,
        currency: row.try_get("currency")?,
        notes: row.try_get("notes")?,
        created_at: parse_db_timestamp(&created_at, "created_at")?,
    })
}
