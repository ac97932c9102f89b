// ABOUTME: Salesperson profile storage layer using SQLite
// ABOUTME: Profiles resolve the display name and address for reminder digests

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::PROFILE_ID_PREFIX;
use robodesk_core::{generate_id, validate_email, validate_required, SalespersonProfile};

use crate::{StorageError, StorageResult};

pub struct ProfileStorage {
    pool: SqlitePool,
}

impl ProfileStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_profile(
        &self,
        full_name: &str,
        email: &str,
    ) -> StorageResult<SalespersonProfile> {
        validate_required(full_name, "Full name")?;
        validate_email(email)?;

        let profile = SalespersonProfile {
            id: generate_id(PROFILE_ID_PREFIX),
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
        };
        self.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Insert or replace a profile mirrored from the identity provider
    pub async fn upsert_profile(&self, profile: &SalespersonProfile) -> StorageResult<()> {
        debug!("Upserting salesperson profile: {}", profile.id);

        sqlx::query(
            r#"
            INSERT INTO salesperson_profiles (id, full_name, email) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET full_name = excluded.full_name, email = excluded.email
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Look up a profile; a missing profile is not an error
    pub async fn get_profile(&self, profile_id: &str) -> StorageResult<Option<SalespersonProfile>> {
        let row = sqlx::query("SELECT * FROM salesperson_profiles WHERE id = ?")
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_profile).transpose()
    }
}

fn row_to_profile(row: &SqliteRow) -> StorageResult<SalespersonProfile> {
    Ok(SalespersonProfile {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
    })
}
