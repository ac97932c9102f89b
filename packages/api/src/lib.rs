// ABOUTME: HTTP API layer for Robodesk providing REST endpoints and routing
// ABOUTME: Integration layer over the pipeline, documents and notifications packages

use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod documents_handlers;
pub mod health;
pub mod jobs_handlers;
pub mod offers_handlers;
pub mod response;
pub mod state;
pub mod subscriptions_handlers;

pub use response::{ApiError, ApiResponse};
pub use state::{AppState, ServiceSettings};

/// Creates the offers API router (nested under /api/offers)
pub fn create_offers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(offers_handlers::create_offer))
        .route("/{offer_id}", get(offers_handlers::get_offer))
        .route(
            "/{offer_id}/follow-up",
            put(offers_handlers::update_follow_up),
        )
        .route("/{offer_id}/stage", post(offers_handlers::transition_stage))
        .route(
            "/{offer_id}/line-items",
            get(offers_handlers::list_line_items),
        )
        .route(
            "/{offer_id}/line-items",
            post(offers_handlers::add_line_item),
        )
        .route(
            "/{offer_id}/line-items/{item_id}",
            delete(offers_handlers::remove_line_item),
        )
        .route(
            "/{offer_id}/versions",
            post(documents_handlers::create_offer_version),
        )
        .route(
            "/{offer_id}/versions",
            get(documents_handlers::list_versions),
        )
}

/// Creates the contracts API router (nested under /api/contracts)
pub fn create_contracts_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{contract_id}/versions",
            post(documents_handlers::create_contract_version),
        )
        .route(
            "/{contract_id}/versions",
            get(documents_handlers::list_versions),
        )
}

/// Creates the document versions API router (nested under /api/versions)
pub fn create_versions_router() -> Router<AppState> {
    Router::new()
        .route("/{version_id}", get(documents_handlers::get_version))
        .route(
            "/{version_id}/download",
            get(documents_handlers::download_version),
        )
        .route("/{version_id}/url", get(documents_handlers::get_public_url))
        .route(
            "/{version_id}/email",
            post(documents_handlers::email_version),
        )
        .route(
            "/{version_id}/deliveries",
            get(documents_handlers::list_deliveries),
        )
}

/// Creates the job trigger router (nested under /api/jobs)
pub fn create_jobs_router() -> Router<AppState> {
    Router::new()
        .route("/reminders", post(jobs_handlers::run_reminders))
        .route("/reports", post(jobs_handlers::run_reports))
}

/// Creates the report subscriptions router (nested under /api/subscriptions)
pub fn create_subscriptions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(subscriptions_handlers::list_subscriptions))
        .route("/", post(subscriptions_handlers::create_subscription))
        .route(
            "/{subscription_id}",
            get(subscriptions_handlers::get_subscription),
        )
        .route(
            "/{subscription_id}/enabled",
            put(subscriptions_handlers::set_enabled),
        )
}

/// Full API with state applied; the binary adds CORS and tracing layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/status", get(health::status_check))
        .nest("/api/offers", create_offers_router())
        .nest("/api/contracts", create_contracts_router())
        .nest("/api/versions", create_versions_router())
        .nest("/api/jobs", create_jobs_router())
        .nest("/api/subscriptions", create_subscriptions_router())
        .with_state(state)
}
