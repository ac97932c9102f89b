// ABOUTME: Client storage layer using SQLite
// ABOUTME: Clients are read by document rendering and counted by period reports

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::CLIENT_ID_PREFIX;
use robodesk_core::{generate_id, validate_email, validate_required, Client, ClientCreateInput};

use crate::{parse_db_timestamp, to_db_timestamp, StorageError, StorageResult};

pub struct ClientStorage {
    pool: SqlitePool,
}

impl ClientStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_client(&self, input: ClientCreateInput) -> StorageResult<Client> {
        validate_required(&input.name, "Client name")?;
        if let Some(email) = input.email.as_deref() {
            validate_email(email)?;
        }

        let client_id = generate_id(CLIENT_ID_PREFIX);
        debug!("Creating client: {} ({})", client_id, input.name);

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, contact_person, email, phone, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client_id)
        .bind(&input.name)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(to_db_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_client(&client_id).await
    }

    pub async fn get_client(&self, client_id: &str) -> StorageResult<Client> {
        debug!("Fetching client: {}", client_id);

        let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Client {}", client_id)))?;

        row_to_client(&row)
    }
}

fn row_to_client(row: &SqliteRow) -> StorageResult<Client> {
    let created_at: String = row.try_get("created_at")?;

    Ok(Client {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        contact_person: row.try_get("contact_person")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_at: parse_db_timestamp(&created_at, "created_at")?,
    })
}
