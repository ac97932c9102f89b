// ABOUTME: Line item editing for offers still open to changes
// ABOUTME: Edits are limited to leads and qualified and keep the offer total in sync

use tracing::info;

use robodesk_core::{LineItemInput, Offer, OfferLineItem, ServiceError, ServiceResult};
use robodesk_storage::OfferStorage;

pub struct LineItemEditor {
    offers: OfferStorage,
}

impl LineItemEditor {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            offers: OfferStorage::new(pool),
        }
    }

    pub async fn add_line_item(
        &self,
        offer_id: &str,
        input: &LineItemInput,
    ) -> ServiceResult<OfferLineItem> {
        let offer = self.editable_offer(offer_id).await?;

        let item = self.offers.insert_line_item(offer_id, input).await?;
        let total = self.offers.refresh_total(offer_id).await?;
        info!(
            "Added line item {} to offer {}; total now {:.2} {}",
            item.id, offer.offer_number, total, offer.currency
        );

        Ok(item)
    }

    pub async fn remove_line_item(&self, offer_id: &str, item_id: &str) -> ServiceResult<f64> {
        let offer = self.editable_offer(offer_id).await?;

        self.offers.delete_line_item(offer_id, item_id).await?;
        let total = self.offers.refresh_total(offer_id).await?;
        info!(
            "Removed line item {} from offer {}; total now {:.2} {}",
            item_id, offer.offer_number, total, offer.currency
        );

        Ok(total)
    }

    pub async fn list_line_items(&self, offer_id: &str) -> ServiceResult<Vec<OfferLineItem>> {
        self.offers.get_offer(offer_id).await?;
        Ok(self.offers.list_line_items(offer_id).await?)
    }

    async fn editable_offer(&self, offer_id: &str) -> ServiceResult<Offer> {
        let offer = self.offers.get_offer(offer_id).await?;
        if !offer.stage.allows_line_item_edits() {
            return Err(ServiceError::precondition(format!(
                "Line items of offer {} are locked in stage {}",
                offer.offer_number, offer.stage
            )));
        }
        Ok(offer)
    }
}
