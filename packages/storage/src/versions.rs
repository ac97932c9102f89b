// ABOUTME: Document version metadata storage using SQLite
// ABOUTME: Rows are insert-only; a unique index on (document_id, version_number) arbitrates races

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use robodesk_core::constants::{MAX_NOTES_LEN, VERSION_ID_PREFIX};
use robodesk_core::{generate_id, validate_length, DocumentKind, DocumentVersion};

use crate::{
    map_write_error, parse_db_enum, parse_db_timestamp, to_db_timestamp, StorageError,
    StorageResult,
};

/// Metadata for a version whose bytes are already in the artifact store
#[derive(Debug, Clone)]
pub struct NewDocumentVersion {
    pub document_id: String,
    pub document_kind: DocumentKind,
    pub version_number: i64,
    pub storage_key: String,
    pub generated_by: String,
    pub notes: Option<String>,
}

pub struct DocumentVersionStorage {
    pool: SqlitePool,
}

impl DocumentVersionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Highest allocated version number for a document, 0 if none
    pub async fn max_version_number(&self, document_id: &str) -> StorageResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) FROM document_versions WHERE document_id = ?",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Insert a version row
    ///
    /// Returns `Conflict` when the version number was taken by a concurrent
    /// writer.
    pub async fn insert(&self, version: NewDocumentVersion) -> StorageResult<DocumentVersion> {
        if let Some(notes) = version.notes.as_deref() {
            validate_length(notes, "Notes", MAX_NOTES_LEN)?;
        }

        let version_id = generate_id(VERSION_ID_PREFIX);
        debug!(
            "Recording version {} of document {} as {}",
            version.version_number, version.document_id, version_id
        );

        sqlx::query(
            r#"
            INSERT INTO document_versions (
                id, document_id, document_kind, version_number, storage_key,
                generated_at, generated_by, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&version_id)
        .bind(&version.document_id)
        .bind(version.document_kind.as_str())
        .bind(version.version_number)
        .bind(&version.storage_key)
        .bind(to_db_timestamp(Utc::now()))
        .bind(&version.generated_by)
        .bind(&version.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                &format!(
                    "Version {} of document {}",
                    version.version_number, version.document_id
                ),
            )
        })?;

        self.get_version(&version_id).await
    }

    pub async fn get_version(&self, version_id: &str) -> StorageResult<DocumentVersion> {
        debug!("Fetching document version: {}", version_id);

        let row = sqlx::query("SELECT * FROM document_versions WHERE id = ?")
            .bind(version_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::NotFound(format!("Document version {}", version_id)))?;

        row_to_version(&row)
    }

    /// All versions of a document, newest first
    pub async fn list_for_document(&self, document_id: &str) -> StorageResult<Vec<DocumentVersion>> {
        let rows = sqlx::query(
            "SELECT * FROM document_versions WHERE document_id = ? ORDER BY version_number DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_version).collect()
    }
}

fn row_to_version(row: &SqliteRow) -> StorageResult<DocumentVersion> {
    let document_kind: String = row.try_get("document_kind")?;
    let generated_at: String = row.try_get("generated_at")?;

    Ok(DocumentVersion {
        id: row.try_get("id")?,
        document_id: row.try_get("document_id")?,
        document_kind: parse_db_enum(&document_kind, "document_kind")?,
        version_number: row.try_get("version_number")?,
        storage_key: row.try_get("storage_key")?,
        generated_at: parse_db_timestamp(&generated_at, "generated_at")?,
        generated_by: row.try_get("generated_by")?,
        notes: row.try_get("notes")?,
    })
}
