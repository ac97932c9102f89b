// ABOUTME: HTTP triggers for the reminder sweep and the periodic sales reports
// ABOUTME: Lets an external scheduler run the jobs over HTTP instead of the CLI

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use tracing::info;

use crate::response::{ok, ApiError};
use crate::state::AppState;

/// Request body for a report run
#[derive(Deserialize)]
pub struct RunReportsRequest {
    pub frequency: String,
    #[serde(default)]
    pub force: bool,
}

/// Email follow-up digests for overdue and upcoming leads
pub async fn run_reminders(State(state): State<AppState>) -> impl IntoResponse {
    info!("Reminder sweep requested over HTTP");

    match state.reminders.run().await {
        Ok(summary) => ok(summary),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Send weekly or monthly reports to enabled subscribers
pub async fn run_reports(
    State(state): State<AppState>,
    Json(request): Json<RunReportsRequest>,
) -> impl IntoResponse {
    info!(
        "{} report run requested over HTTP (force: {})",
        request.frequency, request.force
    );

    match state.reports.run_str(&request.frequency, request.force).await {
        Ok(summary) => ok(summary),
        Err(e) => ApiError::from(e).into_response(),
    }
}
