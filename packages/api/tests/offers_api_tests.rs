// ABOUTME: Integration tests for offer, stage transition and line item endpoints
// ABOUTME: Exercises the pipeline guards through HTTP against an in-memory database

mod common;

use common::{create_test_offer, create_test_parties, delete, get, post_json, setup_test_server};
use serde_json::json;

#[tokio::test]
async fn test_create_and_get_offer() {
    let ctx = setup_test_server().await;
    let (client_id, salesperson_id) = create_test_parties(&ctx.pool).await;

    let response = post_json(
        &ctx.base_url,
        "/api/offers",
        &json!({
            "offerNumber": "OF-2025-014",
            "title": "Welding cell retrofit",
            "clientId": client_id,
            "salespersonId": salesperson_id,
            "nextActionDate": "2025-03-20"
        }),
    )
    .await;
    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["stage"], "leads");
    assert_eq!(body["data"]["currency"], "EUR");
    let offer_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = get(&ctx.base_url, &format!("/api/offers/{}", offer_id)).await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["offer_number"], "OF-2025-014");
    assert_eq!(body["data"]["next_action_date"], "2025-03-20");
}

#[tokio::test]
async fn test_duplicate_offer_number_is_conflict() {
    let ctx = setup_test_server().await;
    create_test_offer(&ctx.pool, "OF-2025-001", false).await;
    let (client_id, salesperson_id) = create_test_parties(&ctx.pool).await;

    let response = post_json(
        &ctx.base_url,
        "/api/offers",
        &json!({
            "offerNumber": "OF-2025-001",
            "title": "Duplicate",
            "clientId": client_id,
            "salespersonId": salesperson_id
        }),
    )
    .await;

    assert_eq!(response.status(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_get_unknown_offer_returns_404() {
    let ctx = setup_test_server().await;

    let response = get(&ctx.base_url, "/api/offers/off-missing").await;

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_leaving_leads_without_line_items_is_rejected() {
    let ctx = setup_test_server().await;
    let offer_id = create_test_offer(&ctx.pool, "OF-2025-002", false).await;

    let response = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/stage", offer_id),
        &json!({ "stage": "qualified" }),
    )
    .await;

    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "PRECONDITION_FAILED");

    // Stage is unchanged
    let body: serde_json::Value = get(&ctx.base_url, &format!("/api/offers/{}", offer_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["stage"], "leads");
}

#[tokio::test]
async fn test_stage_transition_after_adding_line_item() {
    let ctx = setup_test_server().await;
    let offer_id = create_test_offer(&ctx.pool, "OF-2025-003", false).await;

    let response = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/line-items", offer_id),
        &json!({
            "description": "Gripper",
            "unit": "pcs",
            "quantity": 3,
            "unitPrice": 250.5
        }),
    )
    .await;
    assert_eq!(response.status(), 201);

    let response = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/stage", offer_id),
        &json!({ "stage": "proposal_sent" }),
    )
    .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["stage"], "proposal_sent");
    assert_eq!(body["data"]["total_price"], 751.5);
}

#[tokio::test]
async fn test_unknown_stage_is_validation_error() {
    let ctx = setup_test_server().await;
    let offer_id = create_test_offer(&ctx.pool, "OF-2025-004", true).await;

    let response = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/stage", offer_id),
        &json!({ "stage": "archived" }),
    )
    .await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_remove_line_item_updates_total() {
    let ctx = setup_test_server().await;
    let offer_id = create_test_offer(&ctx.pool, "OF-2025-005", true).await;

    let body: serde_json::Value = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/line-items", offer_id),
        &json!({
            "description": "Safety fence",
            "unit": "m",
            "quantity": 10,
            "unitPrice": 40
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = delete(
        &ctx.base_url,
        &format!("/api/offers/{}/line-items/{}", offer_id, item_id),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalPrice"], 3000.0);

    let body: serde_json::Value = get(&ctx.base_url, &format!("/api/offers/{}/line-items", offer_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_line_items_locked_after_proposal_sent() {
    let ctx = setup_test_server().await;
    let offer_id = create_test_offer(&ctx.pool, "OF-2025-006", true).await;

    post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/stage", offer_id),
        &json!({ "stage": "proposal_sent" }),
    )
    .await;

    let response = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/line-items", offer_id),
        &json!({
            "description": "Late addition",
            "unit": "pcs",
            "quantity": 1,
            "unitPrice": 10
        }),
    )
    .await;

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn test_invalid_line_item_quantity_is_rejected() {
    let ctx = setup_test_server().await;
    let offer_id = create_test_offer(&ctx.pool, "OF-2025-007", false).await;

    let response = post_json(
        &ctx.base_url,
        &format!("/api/offers/{}/line-items", offer_id),
        &json!({
            "description": "Nothing",
            "unit": "pcs",
            "quantity": 0,
            "unitPrice": 10
        }),
    )
    .await;

    assert_eq!(response.status(), 400);
}
