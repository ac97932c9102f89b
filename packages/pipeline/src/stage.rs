// ABOUTME: Sales-stage state machine for offers
// ABOUTME: Public entry point for stage changes; the checked write lives in OfferStorage

use sqlx::SqlitePool;
use tracing::{debug, info};

use robodesk_core::{Offer, ServiceResult, Stage};
use robodesk_storage::OfferStorage;

/// Validates and applies stage transitions
///
/// Leaving `leads` requires at least one line item. Every other move is
/// allowed, including reopening a closed offer.
pub struct StageGuard {
    offers: OfferStorage,
}

impl StageGuard {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            offers: OfferStorage::new(pool),
        }
    }

    /// Move an offer to `target`, returning the updated offer
    pub async fn request_transition(&self, offer_id: &str, target: Stage) -> ServiceResult<Offer> {
        debug!("Transition requested for offer {} to {}", offer_id, target);

        let change = self.offers.transition_stage(offer_id, target).await?;
        info!(
            "Offer {} moved from {} to {}",
            change.offer.offer_number, change.from, change.offer.stage
        );

        Ok(change.offer)
    }

    /// Same as [`request_transition`](Self::request_transition) for a raw stage name
    pub async fn request_transition_str(&self, offer_id: &str, target: &str) -> ServiceResult<Offer> {
        let target: Stage = target.parse()?;
        self.request_transition(offer_id, target).await
    }
}
