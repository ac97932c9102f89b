// ABOUTME: Integration tests for the document version manager
// ABOUTME: In-memory database, temporary artifact root and a mocked notifier

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use mockall::mock;
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;
use tempfile::TempDir;

use robodesk_core::{
    ClientCreateInput, ContractCreateInput, ContractStatus, DeliveryStatus, DocumentKind,
    LineItemInput, OfferCreateInput, ServiceError,
};
use robodesk_documents::{RenderInputs, VersionManager};
use robodesk_notifications::{Notifier, NotifierError, OutgoingEmail};
use robodesk_storage::db::connect_in_memory;
use robodesk_storage::{
    ArtifactStore, ClientStorage, ContractStorage, LocalArtifactStore, OfferStorage,
};

mock! {
    pub Notifier {}

    #[async_trait]
    impl Notifier for Notifier {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifierError>;
    }
}

const SENDER: &str = "Robodesk <noreply@robodesk.example>";

struct Fixture {
    pool: SqlitePool,
    artifacts: Arc<LocalArtifactStore>,
    offer_id: String,
    _dir: TempDir,
}

async fn fixture() -> Fixture {
    let pool = connect_in_memory().await.unwrap();
    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(LocalArtifactStore::new(dir.path()));

    let client = ClientStorage::new(pool.clone())
        .create_client(ClientCreateInput {
            name: "Alpine Packaging AG".to_string(),
            contact_person: Some("Urs Meier".to_string()),
            email: Some("urs@alpine-packaging.example".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let offers = OfferStorage::new(pool.clone());
    let offer = offers
        .create_offer(OfferCreateInput {
            offer_number: "OF-2025-042".to_string(),
            title: "Case packer automation".to_string(),
            lead_status: None,
            next_action_date: None,
            currency: "CHF".to_string(),
            salesperson_id: "usr-anna".to_string(),
            client_id: client.id,
            follow_up_notes: None,
        })
        .await
        .unwrap();
    offers
        .insert_line_item(
            &offer.id,
            &LineItemInput {
                description: "Delta picker".to_string(),
                unit: "pcs".to_string(),
                quantity: 2.0,
                unit_price: 21_000.0,
            },
        )
        .await
        .unwrap();
    offers.refresh_total(&offer.id).await.unwrap();

    Fixture {
        pool,
        artifacts,
        offer_id: offer.id,
        _dir: dir,
    }
}

fn silent_notifier() -> Arc<MockNotifier> {
    let mut notifier = MockNotifier::new();
    notifier.expect_send().never();
    Arc::new(notifier)
}

fn manager(fx: &Fixture, notifier: Arc<MockNotifier>) -> VersionManager {
    VersionManager::new(fx.pool.clone(), fx.artifacts.clone(), notifier, SENDER)
}

#[tokio::test]
async fn test_sequential_versions_are_numbered_from_one() {
    let fx = fixture().await;
    let manager = manager(&fx, silent_notifier());
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();

    let first = manager
        .create_version(&fx.offer_id, &inputs, "usr-anna", None)
        .await
        .unwrap();
    let second = manager
        .create_version(&fx.offer_id, &inputs, "usr-anna", Some("Updated pricing"))
        .await
        .unwrap();

    assert_eq!(first.version_number, 1);
    assert_eq!(second.version_number, 2);
    assert_eq!(first.document_kind, DocumentKind::Offer);
    assert_ne!(first.storage_key, second.storage_key);
    assert!(first.storage_key.starts_with(&format!("{}/OF-2025-042_v1_", fx.offer_id)));
    assert_eq!(second.notes.as_deref(), Some("Updated pricing"));

    let stored = fx.artifacts.download(&first.storage_key).await.unwrap();
    let fetched = manager.fetch_version(&first.id).await.unwrap();
    assert_eq!(fetched, stored);
    assert!(fetched.starts_with(b"%PDF"));

    let listed: Vec<i64> = manager
        .list_versions(&fx.offer_id)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(listed, vec![2, 1]);
}

#[tokio::test]
async fn test_concurrent_versions_get_unique_numbers() {
    let fx = fixture().await;
    let manager = manager(&fx, silent_notifier());
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();

    let results = join_all(
        (0..5).map(|_| manager.create_version(&fx.offer_id, &inputs, "usr-anna", None)),
    )
    .await;

    let numbers: HashSet<i64> = results
        .into_iter()
        .map(|r| r.unwrap().version_number)
        .collect();
    assert_eq!(numbers, (1..=5).collect::<HashSet<i64>>());
}

#[tokio::test]
async fn test_separate_managers_recover_from_number_collisions() {
    let fx = fixture().await;
    let a = manager(&fx, silent_notifier());
    let b = manager(&fx, silent_notifier());
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();

    let (first, second) = tokio::join!(
        a.create_version(&fx.offer_id, &inputs, "usr-anna", None),
        b.create_version(&fx.offer_id, &inputs, "usr-max", None),
    );

    let mut numbers = vec![
        first.unwrap().version_number,
        second.unwrap().version_number,
    ];
    numbers.sort();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn test_fetch_unknown_version_is_not_found() {
    let fx = fixture().await;
    let err = manager(&fx, silent_notifier())
        .fetch_version("ver-missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_fetch_with_missing_blob_is_not_found() {
    let fx = fixture().await;
    let manager = manager(&fx, silent_notifier());
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();
    let version = manager
        .create_version(&fx.offer_id, &inputs, "usr-anna", None)
        .await
        .unwrap();

    let path = version
        .storage_key
        .split('/')
        .fold(fx.artifacts.root().to_path_buf(), |p, s| p.join(s));
    std::fs::remove_file(path).unwrap();

    let err = manager.fetch_version(&version.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_malformed_document_id_is_rejected() {
    let fx = fixture().await;
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();
    let err = manager(&fx, silent_notifier())
        .create_version("../etc", &inputs, "usr-anna", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_email_version_sends_attachment_and_records_delivery() {
    let fx = fixture().await;

    let mut notifier = MockNotifier::new();
    notifier
        .expect_send()
        .withf(|email| {
            email.to == "urs@alpine-packaging.example"
                && email.subject == "Offer OF-2025-042 (version 1)"
                && email.html.contains("Dear Urs &amp; team,")
                && email.attachments.len() == 1
                && email.attachments[0].content.starts_with(b"%PDF")
        })
        .times(1)
        .returning(|_| Ok(()));

    let manager = manager(&fx, Arc::new(notifier));
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();
    let version = manager
        .create_version(&fx.offer_id, &inputs, "usr-anna", None)
        .await
        .unwrap();

    let record = manager
        .email_version(
            &version.id,
            "urs@alpine-packaging.example",
            Some("Urs & team"),
            "usr-anna",
            Some("Sent after call"),
        )
        .await
        .unwrap();

    assert_eq!(record.status, DeliveryStatus::Sent);
    assert_eq!(record.document_version_id, version.id);

    let deliveries = manager.list_deliveries(&version.id).await.unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].sent_by, "usr-anna");
    assert_eq!(deliveries[0].notes.as_deref(), Some("Sent after call"));
}

#[tokio::test]
async fn test_email_failure_records_nothing() {
    let fx = fixture().await;

    let mut notifier = MockNotifier::new();
    notifier.expect_send().times(1).returning(|_| {
        Err(NotifierError::Unavailable {
            status: 503,
            message: "maintenance".to_string(),
        })
    });

    let manager = manager(&fx, Arc::new(notifier));
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();
    let version = manager
        .create_version(&fx.offer_id, &inputs, "usr-anna", None)
        .await
        .unwrap();

    let err = manager
        .email_version(&version.id, "urs@alpine-packaging.example", None, "usr-anna", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::UpstreamUnavailable { .. }));
    assert!(manager.list_deliveries(&version.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_email_rejects_invalid_recipient_before_sending() {
    let fx = fixture().await;
    let manager = manager(&fx, silent_notifier());
    let inputs = RenderInputs::for_offer(&fx.pool, &fx.offer_id).await.unwrap();
    let version = manager
        .create_version(&fx.offer_id, &inputs, "usr-anna", None)
        .await
        .unwrap();

    let err = manager
        .email_version(&version.id, "not an address", None, "usr-anna", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_contract_inputs_inherit_offer_line_items() {
    let fx = fixture().await;
    let offer = OfferStorage::new(fx.pool.clone())
        .get_offer(&fx.offer_id)
        .await
        .unwrap();

    let contract = ContractStorage::new(fx.pool.clone())
        .create_contract(ContractCreateInput {
            contract_number: "CT-2025-007".to_string(),
            title: "Case packer delivery".to_string(),
            client_id: offer.client_id.clone(),
            offer_id: Some(offer.id.clone()),
            status: ContractStatus::Draft,
            total_value: 42_000.0,
            currency: "CHF".to_string(),
            notes: Some("Payment 30 days net".to_string()),
        })
        .await
        .unwrap();

    let inputs = RenderInputs::for_contract(&fx.pool, &contract.id).await.unwrap();
    assert_eq!(inputs.document_kind, DocumentKind::Contract);
    assert_eq!(inputs.document_number, "CT-2025-007");
    assert_eq!(inputs.line_items.len(), 1);
    assert_eq!(inputs.subtotal(), 42_000.0);
    assert_eq!(inputs.client.name, "Alpine Packaging AG");

    let version = manager(&fx, silent_notifier())
        .create_version(&contract.id, &inputs, "usr-anna", None)
        .await
        .unwrap();
    assert_eq!(version.version_number, 1);
    assert_eq!(version.document_kind, DocumentKind::Contract);
}
