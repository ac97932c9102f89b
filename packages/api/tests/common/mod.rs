// ABOUTME: Common test utilities for API integration tests
// ABOUTME: Provides test server setup, seeded records, a capturing notifier and HTTP helpers

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::mock;
use sqlx::SqlitePool;
use tempfile::TempDir;

use robodesk_api::{create_router, AppState, ServiceSettings};
use robodesk_core::{ClientCreateInput, LineItemInput, OfferCreateInput};
use robodesk_notifications::{Notifier, NotifierError, OutgoingEmail};
use robodesk_storage::db::connect_in_memory;
use robodesk_storage::{ClientStorage, LocalArtifactStore, OfferStorage, ProfileStorage};

mock! {
    pub Notifier {}

    #[async_trait]
    impl Notifier for Notifier {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifierError>;
    }
}

/// Test context containing server URL, database pool and captured mail
pub struct TestContext {
    pub base_url: String,
    #[allow(dead_code)]
    pub pool: SqlitePool,
    #[allow(dead_code)]
    pub sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    pub _temp_dir: TempDir,
}

/// Create a test server whose notifier accepts every email
pub async fn setup_test_server() -> TestContext {
    setup_test_server_with(false).await
}

/// Create a test server whose notifier rejects every email when `failing` is set
pub async fn setup_test_server_with(failing: bool) -> TestContext {
    let temp_dir = TempDir::new().unwrap();
    let pool = connect_in_memory()
        .await
        .expect("Failed to create database pool");

    let sent = Arc::new(Mutex::new(Vec::new()));
    let captured = sent.clone();
    let mut notifier = MockNotifier::new();
    notifier.expect_send().returning(move |email| {
        if failing {
            return Err(NotifierError::Unavailable {
                status: 503,
                message: "mail relay down".to_string(),
            });
        }
        captured.lock().unwrap().push(email.clone());
        Ok(())
    });

    let artifacts = LocalArtifactStore::new(temp_dir.path().join("artifacts"))
        .with_public_base_url("https://files.robodesk.example");

    let state = AppState::new(
        pool.clone(),
        Arc::new(artifacts),
        Arc::new(notifier),
        ServiceSettings::default(),
    );
    let app = create_router(state);

    // Bind to random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    TestContext {
        base_url,
        pool,
        sent,
        _temp_dir: temp_dir,
    }
}

/// Helper to make GET requests
pub async fn get(base_url: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}{}", base_url, path))
        .send()
        .await
        .expect("Failed to make GET request")
}

/// Helper to make POST requests with JSON body
#[allow(dead_code)]
pub async fn post_json<T: serde::Serialize>(
    base_url: &str,
    path: &str,
    body: &T,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}{}", base_url, path))
        .json(body)
        .send()
        .await
        .expect("Failed to make POST request")
}

/// Helper to make PUT requests with JSON body
#[allow(dead_code)]
pub async fn put_json<T: serde::Serialize>(
    base_url: &str,
    path: &str,
    body: &T,
) -> reqwest::Response {
    reqwest::Client::new()
        .put(format!("{}{}", base_url, path))
        .json(body)
        .send()
        .await
        .expect("Failed to make PUT request")
}

/// Helper to make DELETE requests
#[allow(dead_code)]
pub async fn delete(base_url: &str, path: &str) -> reqwest::Response {
    reqwest::Client::new()
        .delete(format!("{}{}", base_url, path))
        .send()
        .await
        .expect("Failed to make DELETE request")
}

/// Seed a client and salesperson, returning `(client_id, salesperson_id)`
#[allow(dead_code)]
pub async fn create_test_parties(pool: &SqlitePool) -> (String, String) {
    let client = ClientStorage::new(pool.clone())
        .create_client(ClientCreateInput {
            name: "Nordic Automation AB".to_string(),
            contact_person: Some("Anna Berg".to_string()),
            email: Some("anna.berg@nordic.example".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create test client");

    let profile = ProfileStorage::new(pool.clone())
        .create_profile("Jonas Lind", "jonas.lind@robodesk.example")
        .await
        .expect("Failed to create test profile");

    (client.id, profile.id)
}

/// Seed an offer in the leads stage, optionally with one line item
#[allow(dead_code)]
pub async fn create_test_offer(pool: &SqlitePool, offer_number: &str, with_item: bool) -> String {
    let (client_id, salesperson_id) = create_test_parties(pool).await;
    let offers = OfferStorage::new(pool.clone());

    let offer = offers
        .create_offer(OfferCreateInput {
            offer_number: offer_number.to_string(),
            title: "Palletizing cell".to_string(),
            lead_status: None,
            next_action_date: None,
            currency: "EUR".to_string(),
            salesperson_id,
            client_id,
            follow_up_notes: None,
        })
        .await
        .expect("Failed to create test offer");

    if with_item {
        offers
            .insert_line_item(
                &offer.id,
                &LineItemInput {
                    description: "Robot arm".to_string(),
                    unit: "pcs".to_string(),
                    quantity: 2.0,
                    unit_price: 1500.0,
                },
            )
            .await
            .expect("Failed to add test line item");
        offers
            .refresh_total(&offer.id)
            .await
            .expect("Failed to refresh total");
    }

    offer.id
}
