// ABOUTME: Content of a rendered document snapshot
// ABOUTME: Assembled from stored offers and contracts or supplied directly by callers

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use robodesk_core::{Client, DocumentKind, OfferLineItem, ServiceResult};
use robodesk_storage::{ClientStorage, ContractStorage, OfferStorage};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientBlock {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<&Client> for ClientBlock {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            contact_person: client.contact_person.clone(),
            email: client.email.clone(),
            address: client.address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderLineItem {
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

impl From<&OfferLineItem> for RenderLineItem {
    fn from(item: &OfferLineItem) -> Self {
        Self {
            description: item.description.clone(),
            unit: item.unit.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total_price,
        }
    }
}

/// Everything printed on a document snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderInputs {
    pub document_kind: DocumentKind,
    /// Human-readable number, e.g. `OF-2025-014`
    pub document_number: String,
    pub title: String,
    pub client: ClientBlock,
    pub line_items: Vec<RenderLineItem>,
    pub total: Option<f64>,
    pub currency: String,
    pub notes: Option<String>,
}

impl RenderInputs {
    /// Sum of the line item totals
    pub fn subtotal(&self) -> f64 {
        self.line_items.iter().map(|item| item.total).sum()
    }

    /// Snapshot content for a stored offer
    pub async fn for_offer(pool: &SqlitePool, offer_id: &str) -> ServiceResult<Self> {
        let offers = OfferStorage::new(pool.clone());
        let offer = offers.get_offer(offer_id).await?;
        let client = ClientStorage::new(pool.clone())
            .get_client(&offer.client_id)
            .await?;
        let line_items = offers.list_line_items(offer_id).await?;

        Ok(Self {
            document_kind: DocumentKind::Offer,
            document_number: offer.offer_number,
            title: offer.title,
            client: ClientBlock::from(&client),
            line_items: line_items.iter().map(RenderLineItem::from).collect(),
            total: Some(offer.total_price),
            currency: offer.currency,
            notes: None,
        })
    }

    /// Snapshot content for a stored contract
    ///
    /// Line items come from the source offer when the contract has one.
    pub async fn for_contract(pool: &SqlitePool, contract_id: &str) -> ServiceResult<Self> {
        let contract = ContractStorage::new(pool.clone())
            .get_contract(contract_id)
            .await?;
        let client = ClientStorage::new(pool.clone())
            .get_client(&contract.client_id)
            .await?;

        let line_items = match contract.offer_id.as_deref() {
            Some(offer_id) => OfferStorage::new(pool.clone())
                .list_line_items(offer_id)
                .await?
                .iter()
                .map(RenderLineItem::from)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            document_kind: DocumentKind::Contract,
            document_number: contract.contract_number,
            title: contract.title,
            client: ClientBlock::from(&client),
            line_items,
            total: Some(contract.total_value),
            currency: contract.currency,
            notes: contract.notes,
        })
    }
}
