// ABOUTME: HTTP handlers for offers, pipeline stage transitions and line items
// ABOUTME: Stage changes go through StageGuard; line item edits through LineItemEditor

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use robodesk_core::{LeadStatus, LineItemInput, OfferCreateInput};

use crate::response::{created, ok, ApiError};
use crate::state::AppState;

/// Request body for creating an offer
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub offer_number: String,
    pub title: String,
    pub client_id: String,
    pub salesperson_id: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub lead_status: Option<LeadStatus>,
    pub next_action_date: Option<NaiveDate>,
    pub follow_up_notes: Option<String>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Request body for updating follow-up fields
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFollowUpRequest {
    pub lead_status: Option<LeadStatus>,
    pub next_action_date: Option<NaiveDate>,
    pub follow_up_notes: Option<String>,
}

/// Request body for a stage transition
#[derive(Deserialize)]
pub struct StageTransitionRequest {
    pub stage: String,
}

/// Request body for adding a line item
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineItemRequest {
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRemoved {
    pub item_id: String,
    pub total_price: f64,
}

/// Create an offer in the leads stage
pub async fn create_offer(
    State(state): State<AppState>,
    Json(request): Json<CreateOfferRequest>,
) -> impl IntoResponse {
    info!("Creating offer: {}", request.offer_number);

    let input = OfferCreateInput {
        offer_number: request.offer_number,
        title: request.title,
        lead_status: request.lead_status,
        next_action_date: request.next_action_date,
        currency: request.currency,
        salesperson_id: request.salesperson_id,
        client_id: request.client_id,
        follow_up_notes: request.follow_up_notes,
    };

    match state.offers.create_offer(input).await {
        Ok(offer) => created(offer),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get a single offer
pub async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
) -> impl IntoResponse {
    info!("Getting offer: {}", offer_id);

    match state.offers.get_offer(&offer_id).await {
        Ok(offer) => ok(offer),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Update lead status, next action date and follow-up notes
pub async fn update_follow_up(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Json(request): Json<UpdateFollowUpRequest>,
) -> impl IntoResponse {
    info!("Updating follow-up for offer: {}", offer_id);

    match state
        .offers
        .update_follow_up(
            &offer_id,
            request.lead_status,
            request.next_action_date,
            request.follow_up_notes,
        )
        .await
    {
        Ok(offer) => ok(offer),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Move an offer to another pipeline stage
pub async fn transition_stage(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Json(request): Json<StageTransitionRequest>,
) -> impl IntoResponse {
    info!("Stage transition for offer {} to {}", offer_id, request.stage);

    match state
        .stage_guard
        .request_transition_str(&offer_id, &request.stage)
        .await
    {
        Ok(offer) => ok(offer),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List the line items of an offer
pub async fn list_line_items(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
) -> impl IntoResponse {
    match state.line_items.list_line_items(&offer_id).await {
        Ok(items) => ok(items),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Append a line item to an offer
pub async fn add_line_item(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Json(request): Json<AddLineItemRequest>,
) -> impl IntoResponse {
    info!("Adding line item to offer: {}", offer_id);

    let input = LineItemInput {
        description: request.description,
        unit: request.unit,
        quantity: request.quantity,
        unit_price: request.unit_price,
    };

    match state.line_items.add_line_item(&offer_id, &input).await {
        Ok(item) => created(item),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Remove a line item from an offer
pub async fn remove_line_item(
    State(state): State<AppState>,
    Path((offer_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("Removing line item {} from offer: {}", item_id, offer_id);

    match state.line_items.remove_line_item(&offer_id, &item_id).await {
        Ok(total_price) => ok(LineItemRemoved {
            item_id,
            total_price,
        }),
        Err(e) => ApiError::from(e).into_response(),
    }
}
