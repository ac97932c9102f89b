// ABOUTME: Integration tests for stage transitions and line item editing
// ABOUTME: Uses an in-memory migrated SQLite database

use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

use robodesk_core::{
    ClientCreateInput, LineItemInput, OfferCreateInput, ServiceError, Stage, ValidationError,
};
use robodesk_pipeline::{LineItemEditor, StageGuard};
use robodesk_storage::db::connect_in_memory;
use robodesk_storage::{ClientStorage, OfferStorage};

async fn setup() -> (SqlitePool, String) {
    let pool = connect_in_memory().await.unwrap();
    let client = ClientStorage::new(pool.clone())
        .create_client(ClientCreateInput {
            name: "Rheinwerk Logistics".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let offer = OfferStorage::new(pool.clone())
        .create_offer(OfferCreateInput {
            offer_number: "OF-2025-100".to_string(),
            title: "AMR fleet".to_string(),
            lead_status: None,
            next_action_date: None,
            currency: "EUR".to_string(),
            salesperson_id: "usr-max".to_string(),
            client_id: client.id,
            follow_up_notes: None,
        })
        .await
        .unwrap();

    (pool, offer.id)
}

fn item(description: &str, quantity: f64, unit_price: f64) -> LineItemInput {
    LineItemInput {
        description: description.to_string(),
        unit: "pcs".to_string(),
        quantity,
        unit_price,
    }
}

#[tokio::test]
async fn test_leaving_leads_without_line_items_fails_then_succeeds() {
    let (pool, offer_id) = setup().await;
    let guard = StageGuard::new(pool.clone());
    let editor = LineItemEditor::new(pool.clone());

    let err = guard
        .request_transition(&offer_id, Stage::Qualified)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    let unchanged = OfferStorage::new(pool.clone())
        .get_offer(&offer_id)
        .await
        .unwrap();
    assert_eq!(unchanged.stage, Stage::Leads);

    editor
        .add_line_item(&offer_id, &item("MiR250 robot", 1.0, 32_000.0))
        .await
        .unwrap();

    let moved = guard
        .request_transition(&offer_id, Stage::Qualified)
        .await
        .unwrap();
    assert_eq!(moved.stage, Stage::Qualified);
}

#[tokio::test]
async fn test_every_non_leads_target_needs_line_items() {
    let (pool, offer_id) = setup().await;
    let guard = StageGuard::new(pool);

    for target in Stage::ALL.into_iter().filter(|s| *s != Stage::Leads) {
        let err = guard.request_transition(&offer_id, target).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::PreconditionFailed(_)),
            "expected precondition failure for {}",
            target
        );
    }

    let stay = guard.request_transition(&offer_id, Stage::Leads).await.unwrap();
    assert_eq!(stay.stage, Stage::Leads);
}

#[tokio::test]
async fn test_closed_offers_can_be_reopened() {
    let (pool, offer_id) = setup().await;
    let guard = StageGuard::new(pool.clone());
    LineItemEditor::new(pool)
        .add_line_item(&offer_id, &item("Safety scanner", 2.0, 1_200.0))
        .await
        .unwrap();

    guard
        .request_transition(&offer_id, Stage::ClosedLost)
        .await
        .unwrap();
    let reopened = guard
        .request_transition(&offer_id, Stage::Negotiation)
        .await
        .unwrap();
    assert_eq!(reopened.stage, Stage::Negotiation);
}

#[tokio::test]
async fn test_unknown_stage_name_is_validation_error() {
    let (pool, offer_id) = setup().await;
    let err = StageGuard::new(pool)
        .request_transition_str(&offer_id, "won")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidEnum { .. })
    ));
}

#[tokio::test]
async fn test_transition_of_unknown_offer_is_not_found() {
    let (pool, _) = setup().await;
    let err = StageGuard::new(pool)
        .request_transition("off-missing", Stage::Qualified)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_line_item_edits_update_total() {
    let (pool, offer_id) = setup().await;
    let editor = LineItemEditor::new(pool.clone());
    let offers = OfferStorage::new(pool);

    let robot = editor
        .add_line_item(&offer_id, &item("MiR250 robot", 2.0, 30_000.0))
        .await
        .unwrap();
    editor
        .add_line_item(&offer_id, &item("Training", 1.0, 1_500.0))
        .await
        .unwrap();
    assert_eq!(offers.get_offer(&offer_id).await.unwrap().total_price, 61_500.0);

    let total = editor.remove_line_item(&offer_id, &robot.id).await.unwrap();
    assert_eq!(total, 1_500.0);
    assert_eq!(editor.list_line_items(&offer_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_line_items_locked_after_proposal_sent() {
    let (pool, offer_id) = setup().await;
    let editor = LineItemEditor::new(pool.clone());
    let guard = StageGuard::new(pool);

    let existing = editor
        .add_line_item(&offer_id, &item("Charging dock", 1.0, 2_400.0))
        .await
        .unwrap();
    guard
        .request_transition(&offer_id, Stage::Qualified)
        .await
        .unwrap();
    editor
        .add_line_item(&offer_id, &item("Spare battery", 1.0, 900.0))
        .await
        .unwrap();

    guard
        .request_transition(&offer_id, Stage::ProposalSent)
        .await
        .unwrap();

    let add = editor
        .add_line_item(&offer_id, &item("Extra sensor", 1.0, 300.0))
        .await
        .unwrap_err();
    assert!(matches!(add, ServiceError::PreconditionFailed(_)));

    let remove = editor
        .remove_line_item(&offer_id, &existing.id)
        .await
        .unwrap_err();
    assert!(matches!(remove, ServiceError::PreconditionFailed(_)));
}
