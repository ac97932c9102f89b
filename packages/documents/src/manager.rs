// ABOUTME: Version manager for generated offer and contract documents
// ABOUTME: Allocates per-document version numbers, stores PDFs and audits email deliveries

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use robodesk_core::constants::{
    MAX_NOTES_LEN, MAX_RECIPIENT_NAME_LEN, MAX_VERSION_ALLOCATION_ATTEMPTS,
};
use robodesk_core::utils::{filename_segment, short_token};
use robodesk_core::{
    validate_email, validate_length, validate_required, validate_storage_key, DeliveryStatus,
    DocumentKind, DocumentVersion, EmailDeliveryRecord, ServiceError, ServiceResult,
    ValidationError,
};
use robodesk_notifications::Notifier;
use robodesk_storage::{
    ArtifactStore, ContractStorage, DeliveryStorage, DocumentVersionStorage, NewDocumentVersion,
    OfferStorage, StorageError,
};

use crate::inputs::RenderInputs;
use crate::mail::{document_email, DocumentMail};
use crate::pdf::render_pdf;

type LockTable = HashMap<String, Arc<AsyncMutex<()>>>;

/// Generates, stores, retrieves and emails immutable document snapshots
///
/// Version numbers start at 1 and grow by one per document. Allocation is
/// serialized per document inside this manager; across processes the unique
/// index on `(document_id, version_number)` decides, and the loser retries
/// with a fresh maximum.
pub struct VersionManager {
    versions: DocumentVersionStorage,
    deliveries: DeliveryStorage,
    offers: OfferStorage,
    contracts: ContractStorage,
    artifacts: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn Notifier>,
    sender: String,
    allocation_locks: Mutex<LockTable>,
}

impl VersionManager {
    pub fn new(
        pool: SqlitePool,
        artifacts: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            versions: DocumentVersionStorage::new(pool.clone()),
            deliveries: DeliveryStorage::new(pool.clone()),
            offers: OfferStorage::new(pool.clone()),
            contracts: ContractStorage::new(pool),
            artifacts,
            notifier,
            sender: sender.into(),
            allocation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Render, store and record the next version of a document
    ///
    /// `inputs` must describe `document_id`: its kind and number are checked
    /// against the stored offer or contract before anything is rendered.
    pub async fn create_version(
        &self,
        document_id: &str,
        inputs: &RenderInputs,
        generated_by: &str,
        notes: Option<&str>,
    ) -> ServiceResult<DocumentVersion> {
        validate_document_id(document_id)?;
        validate_required(generated_by, "Generated by")?;
        if let Some(notes) = notes {
            validate_length(notes, "Notes", MAX_NOTES_LEN)?;
        }

        let stored_number = self
            .stored_document_number(inputs.document_kind, document_id)
            .await?;
        if stored_number != inputs.document_number {
            return Err(ValidationError::DocumentMismatch {
                document_id: document_id.to_string(),
                number: inputs.document_number.clone(),
            }
            .into());
        }

        let pdf = render_pdf(inputs, Utc::now())?;
        debug!(
            "Rendered {} {} ({} bytes)",
            inputs.document_kind,
            inputs.document_number,
            pdf.len()
        );

        let lock = self.allocation_lock(document_id)?;
        let result = {
            let _guard = lock.lock().await;
            self.allocate_and_store(document_id, inputs, &pdf, generated_by, notes)
                .await
        };
        self.release_allocation_lock(document_id, lock)?;

        result
    }

    async fn allocate_and_store(
        &self,
        document_id: &str,
        inputs: &RenderInputs,
        pdf: &[u8],
        generated_by: &str,
        notes: Option<&str>,
    ) -> ServiceResult<DocumentVersion> {
        for attempt in 1..=MAX_VERSION_ALLOCATION_ATTEMPTS {
            let version_number = self.versions.max_version_number(document_id).await? + 1;
            let storage_key = format!(
                "{}/{}_v{}_{}.pdf",
                document_id,
                filename_segment(&inputs.document_number),
                version_number,
                short_token()
            );

            self.artifacts.upload(&storage_key, pdf, false).await?;

            let inserted = self
                .versions
                .insert(NewDocumentVersion {
                    document_id: document_id.to_string(),
                    document_kind: inputs.document_kind,
                    version_number,
                    storage_key: storage_key.clone(),
                    generated_by: generated_by.to_string(),
                    notes: notes.map(str::to_string),
                })
                .await;

            match inserted {
                Ok(version) => {
                    info!(
                        "Created version {} of {} {} at {}",
                        version.version_number,
                        inputs.document_kind,
                        inputs.document_number,
                        storage_key
                    );
                    return Ok(version);
                }
                Err(StorageError::Conflict(_)) => {
                    warn!(
                        "Version {} of document {} was taken concurrently (attempt {}/{})",
                        version_number, document_id, attempt, MAX_VERSION_ALLOCATION_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(format!(
            "Could not allocate a version number for document {} after {} attempts",
            document_id, MAX_VERSION_ALLOCATION_ATTEMPTS
        )))
    }

    pub async fn get_version(&self, version_id: &str) -> ServiceResult<DocumentVersion> {
        Ok(self.versions.get_version(version_id).await?)
    }

    /// Stored PDF bytes of a version
    pub async fn fetch_version(&self, version_id: &str) -> ServiceResult<Vec<u8>> {
        let version = self.versions.get_version(version_id).await?;
        Ok(self.artifacts.download(&version.storage_key).await?)
    }

    /// Versions of a document, newest first
    pub async fn list_versions(&self, document_id: &str) -> ServiceResult<Vec<DocumentVersion>> {
        Ok(self.versions.list_for_document(document_id).await?)
    }

    pub async fn list_deliveries(&self, version_id: &str) -> ServiceResult<Vec<EmailDeliveryRecord>> {
        self.versions.get_version(version_id).await?;
        Ok(self.deliveries.list_for_version(version_id).await?)
    }

    pub async fn public_url(&self, version_id: &str) -> ServiceResult<String> {
        let version = self.versions.get_version(version_id).await?;
        Ok(self.artifacts.public_url(&version.storage_key)?)
    }

    /// Email a stored version as a PDF attachment and audit the delivery
    ///
    /// Nothing is recorded when the notifier fails.
    pub async fn email_version(
        &self,
        version_id: &str,
        recipient: &str,
        recipient_name: Option<&str>,
        sent_by: &str,
        notes: Option<&str>,
    ) -> ServiceResult<EmailDeliveryRecord> {
        validate_email(recipient)?;
        validate_required(sent_by, "Sent by")?;
        if let Some(name) = recipient_name {
            validate_length(name, "Recipient name", MAX_RECIPIENT_NAME_LEN)?;
        }
        if let Some(notes) = notes {
            validate_length(notes, "Notes", MAX_NOTES_LEN)?;
        }
        let recipient = recipient.trim();

        let version = self.versions.get_version(version_id).await?;
        let pdf = self.artifacts.download(&version.storage_key).await?;
        let document_number = self
            .stored_document_number(version.document_kind, &version.document_id)
            .await?;

        let email = document_email(
            &DocumentMail {
                from: &self.sender,
                to: recipient,
                recipient_name,
                kind: version.document_kind,
                document_number: &document_number,
                version_number: version.version_number,
            },
            pdf,
        );

        self.notifier.send(&email).await?;

        let record = self
            .deliveries
            .record_delivery(&version.id, recipient, sent_by, DeliveryStatus::Sent, notes)
            .await?;
        info!(
            "Emailed version {} of {} to {}",
            version.version_number, document_number, recipient
        );

        Ok(record)
    }

    async fn stored_document_number(
        &self,
        kind: DocumentKind,
        document_id: &str,
    ) -> ServiceResult<String> {
        Ok(match kind {
            DocumentKind::Offer => self.offers.get_offer(document_id).await?.offer_number,
            DocumentKind::Contract => {
                self.contracts
                    .get_contract(document_id)
                    .await?
                    .contract_number
            }
        })
    }

    fn allocation_lock(&self, document_id: &str) -> ServiceResult<Arc<AsyncMutex<()>>> {
        let mut locks = self.lock_table()?;
        Ok(locks.entry(document_id.to_string()).or_default().clone())
    }

    /// Drop the map entry once no other caller holds or waits on it
    fn release_allocation_lock(
        &self,
        document_id: &str,
        lock: Arc<AsyncMutex<()>>,
    ) -> ServiceResult<()> {
        let mut locks = self.lock_table()?;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(document_id);
        }
        Ok(())
    }

    fn lock_table(&self) -> ServiceResult<MutexGuard<'_, LockTable>> {
        self.allocation_locks
            .lock()
            .map_err(|_| ServiceError::Internal("Version allocation lock poisoned".to_string()))
    }

    #[cfg(test)]
    fn pending_allocation_locks(&self) -> usize {
        self.allocation_locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Document ids become the first storage key segment
fn validate_document_id(document_id: &str) -> Result<(), ValidationError> {
    if document_id.contains('/') {
        return Err(ValidationError::MalformedPath(document_id.to_string()));
    }
    validate_storage_key(document_id)
}
