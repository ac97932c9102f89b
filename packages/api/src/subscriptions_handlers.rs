// ABOUTME: HTTP handlers for report subscriptions
// ABOUTME: Create, list, fetch and enable or disable recipients of periodic reports

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use robodesk_core::{Frequency, ReportSubscriptionCreateInput};

use crate::response::{created, ok, ApiError};
use crate::state::AppState;

/// Request body for creating a subscription
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub report_type: String,
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub frequency: String,
}

#[derive(Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

pub async fn list_subscriptions(State(state): State<AppState>) -> impl IntoResponse {
    match state.subscriptions.list_subscriptions().await {
        Ok(subscriptions) => ok(subscriptions),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> impl IntoResponse {
    info!(
        "Creating {} subscription for {}",
        request.frequency, request.recipient_email
    );

    let frequency: Frequency = match request.frequency.parse() {
        Ok(frequency) => frequency,
        Err(e) => return ApiError::from(robodesk_core::ServiceError::from(e)).into_response(),
    };

    let input = ReportSubscriptionCreateInput {
        report_type: request.report_type,
        recipient_email: request.recipient_email,
        recipient_name: request.recipient_name,
        frequency,
    };

    match state.subscriptions.create_subscription(input).await {
        Ok(subscription) => created(subscription),
        Err(e) => ApiError::from(e).into_response(),
    }
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
) -> impl IntoResponse {
    match state.subscriptions.get_subscription(&subscription_id).await {
        Ok(subscription) => ok(subscription),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Enable or disable a subscription
pub async fn set_enabled(
    State(state): State<AppState>,
    Path(subscription_id): Path<String>,
    Json(request): Json<SetEnabledRequest>,
) -> impl IntoResponse {
    info!(
        "Setting subscription {} enabled = {}",
        subscription_id, request.enabled
    );

    match state
        .subscriptions
        .set_enabled(&subscription_id, request.enabled)
        .await
    {
        Ok(subscription) => ok(subscription),
        Err(e) => ApiError::from(e).into_response(),
    }
}
