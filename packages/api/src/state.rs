// ABOUTME: Shared application state for API handlers
// ABOUTME: Wires the pool, artifact store and notifier into the pipeline, document and job services

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::debug;

use robodesk_documents::VersionManager;
use robodesk_notifications::{Notifier, ReminderScheduler, ReportScheduler};
use robodesk_pipeline::{LineItemEditor, StageGuard};
use robodesk_storage::{ArtifactStore, OfferStorage, SubscriptionStorage};

/// Settings the services need beyond their collaborators
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Sender address for every outgoing email
    pub sender: String,
    pub reminder_lookahead_days: i64,
    /// Currency label printed in sales reports
    pub report_currency: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            sender: "Robodesk <noreply@robodesk.local>".to_string(),
            reminder_lookahead_days: robodesk_core::REMINDER_LOOKAHEAD_DAYS,
            report_currency: "EUR".to_string(),
        }
    }
}

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub offers: Arc<OfferStorage>,
    pub stage_guard: Arc<StageGuard>,
    pub line_items: Arc<LineItemEditor>,
    pub versions: Arc<VersionManager>,
    pub reminders: Arc<ReminderScheduler>,
    pub reports: Arc<ReportScheduler>,
    pub subscriptions: Arc<SubscriptionStorage>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        artifacts: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        settings: ServiceSettings,
    ) -> Self {
        debug!(
            "Building application state (sender: {}, look-ahead: {} days)",
            settings.sender, settings.reminder_lookahead_days
        );

        Self {
            offers: Arc::new(OfferStorage::new(pool.clone())),
            stage_guard: Arc::new(StageGuard::new(pool.clone())),
            line_items: Arc::new(LineItemEditor::new(pool.clone())),
            versions: Arc::new(VersionManager::new(
                pool.clone(),
                artifacts,
                notifier.clone(),
                settings.sender.clone(),
            )),
            reminders: Arc::new(
                ReminderScheduler::new(pool.clone(), notifier.clone(), settings.sender.clone())
                    .with_lookahead_days(settings.reminder_lookahead_days),
            ),
            reports: Arc::new(ReportScheduler::new(
                pool.clone(),
                notifier,
                settings.sender,
                settings.report_currency,
            )),
            subscriptions: Arc::new(SubscriptionStorage::new(pool.clone())),
            pool,
        }
    }
}
