// ABOUTME: HTTP handlers for versioned offer and contract documents
// ABOUTME: Snapshot creation, listing, PDF download, public links, emailing and delivery history

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use robodesk_core::{DocumentKind, ServiceResult};
use robodesk_documents::RenderInputs;

use crate::response::{created, ok, ApiError};
use crate::state::AppState;

/// Request body for generating a new document version
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    pub generated_by: String,
    pub notes: Option<String>,
}

/// Request body for emailing a stored version
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVersionRequest {
    pub recipient: String,
    pub recipient_name: Option<String>,
    pub sent_by: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct PublicUrl {
    pub url: String,
}

async fn create_version(
    state: &AppState,
    kind: DocumentKind,
    document_id: &str,
    request: &CreateVersionRequest,
) -> ServiceResult<robodesk_core::DocumentVersion> {
    let inputs = match kind {
        DocumentKind::Offer => RenderInputs::for_offer(&state.pool, document_id).await?,
        DocumentKind::Contract => RenderInputs::for_contract(&state.pool, document_id).await?,
    };

    state
        .versions
        .create_version(
            document_id,
            &inputs,
            &request.generated_by,
            request.notes.as_deref(),
        )
        .await
}

/// Snapshot the current state of an offer as a new PDF version
pub async fn create_offer_version(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Json(request): Json<CreateVersionRequest>,
) -> impl IntoResponse {
    info!("Generating document version for offer: {}", offer_id);

    match create_version(&state, DocumentKind::Offer, &offer_id, &request).await {
        Ok(version) => created(version),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Snapshot the current state of a contract as a new PDF version
pub async fn create_contract_version(
    State(state): State<AppState>,
    Path(contract_id): Path<String>,
    Json(request): Json<CreateVersionRequest>,
) -> impl IntoResponse {
    info!("Generating document version for contract: {}", contract_id);

    match create_version(&state, DocumentKind::Contract, &contract_id, &request).await {
        Ok(version) => created(version),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List all versions of a document, newest first
pub async fn list_versions(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    match state.versions.list_versions(&document_id).await {
        Ok(versions) => ok(versions),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get version metadata
pub async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> impl IntoResponse {
    match state.versions.get_version(&version_id).await {
        Ok(version) => ok(version),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Stream the stored PDF bytes of a version
pub async fn download_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> impl IntoResponse {
    info!("Downloading document version: {}", version_id);

    let version = match state.versions.get_version(&version_id).await {
        Ok(version) => version,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match state.versions.fetch_version(&version_id).await {
        Ok(bytes) => {
            let filename = version
                .storage_key
                .rsplit('/')
                .next()
                .unwrap_or("document.pdf")
                .to_string();

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Public link to the stored PDF
pub async fn get_public_url(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> impl IntoResponse {
    match state.versions.public_url(&version_id).await {
        Ok(url) => ok(PublicUrl { url }),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Email a stored version and record the delivery
pub async fn email_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
    Json(request): Json<EmailVersionRequest>,
) -> impl IntoResponse {
    info!("Emailing document version {} to {}", version_id, request.recipient);

    match state
        .versions
        .email_version(
            &version_id,
            &request.recipient,
            request.recipient_name.as_deref(),
            &request.sent_by,
            request.notes.as_deref(),
        )
        .await
    {
        Ok(record) => created(record),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Delivery history of a version, oldest first
pub async fn list_deliveries(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> impl IntoResponse {
    match state.versions.list_deliveries(&version_id).await {
        Ok(records) => ok(records),
        Err(e) => ApiError::from(e).into_response(),
    }
}
