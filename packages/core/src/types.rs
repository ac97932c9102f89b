// ABOUTME: Domain type definitions for offers, documents, deliveries and report subscriptions
// ABOUTME: Enumerations carry their stored string form and parse back with validation errors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

/// Pipeline stage of an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Leads,
    Qualified,
    ProposalSent,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Leads,
        Stage::Qualified,
        Stage::ProposalSent,
        Stage::Negotiation,
        Stage::ClosedWon,
        Stage::ClosedLost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Leads => "leads",
            Stage::Qualified => "qualified",
            Stage::ProposalSent => "proposal_sent",
            Stage::Negotiation => "negotiation",
            Stage::ClosedWon => "closed_won",
            Stage::ClosedLost => "closed_lost",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Stage::ClosedWon | Stage::ClosedLost)
    }

    /// Line items may only be added or removed in these stages
    pub fn allows_line_item_edits(&self) -> bool {
        matches!(self, Stage::Leads | Stage::Qualified)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidEnum {
                kind: "stage",
                value: s.to_string(),
                allowed: "leads, qualified, proposal_sent, negotiation, closed_won, closed_lost",
            })
    }
}

/// Finer-grained status of an offer while it sits in `leads`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    FollowUp,
    Qualified,
    ClosedWon,
    ClosedLost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::FollowUp => "follow_up",
            LeadStatus::Qualified => "qualified",
            LeadStatus::ClosedWon => "closed_won",
            LeadStatus::ClosedLost => "closed_lost",
        }
    }

    /// Closed leads never show up in follow-up reminders
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::ClosedWon | LeadStatus::ClosedLost)
    }

    /// Human-readable label for digests
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::FollowUp => "Follow-up",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::ClosedWon => "Closed (won)",
            LeadStatus::ClosedLost => "Closed (lost)",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "follow_up" => Ok(LeadStatus::FollowUp),
            "qualified" => Ok(LeadStatus::Qualified),
            "closed_won" => Ok(LeadStatus::ClosedWon),
            "closed_lost" => Ok(LeadStatus::ClosedLost),
            _ => Err(ValidationError::InvalidEnum {
                kind: "lead status",
                value: s.to_string(),
                allowed: "new, contacted, follow_up, qualified, closed_won, closed_lost",
            }),
        }
    }
}

/// Which record a document version snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Offer,
    Contract,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Offer => "offer",
            DocumentKind::Contract => "contract",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Offer => "Offer",
            DocumentKind::Contract => "Contract",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offer" => Ok(DocumentKind::Offer),
            "contract" => Ok(DocumentKind::Contract),
            _ => Err(ValidationError::InvalidEnum {
                kind: "document kind",
                value: s.to_string(),
                allowed: "offer, contract",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Active,
    Expired,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Active => "active",
            ContractStatus::Expired => "expired",
            ContractStatus::Terminated => "terminated",
        }
    }
}

impl FromStr for ContractStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContractStatus::Draft),
            "active" => Ok(ContractStatus::Active),
            "expired" => Ok(ContractStatus::Expired),
            "terminated" => Ok(ContractStatus::Terminated),
            _ => Err(ValidationError::InvalidEnum {
                kind: "contract status",
                value: s.to_string(),
                allowed: "draft, active, expired, terminated",
            }),
        }
    }
}

/// Report cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(ValidationError::InvalidEnum {
                kind: "frequency",
                value: s.to_string(),
                allowed: "weekly, monthly",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(ValidationError::InvalidEnum {
                kind: "delivery status",
                value: s.to_string(),
                allowed: "sent, failed",
            }),
        }
    }
}

/// A sales opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub offer_number: String,
    pub title: String,
    pub stage: Stage,
    pub lead_status: Option<LeadStatus>,
    pub next_action_date: Option<NaiveDate>,
    pub total_price: f64,
    pub currency: String,
    pub salesperson_id: String,
    pub client_id: String,
    pub follow_up_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferCreateInput {
    pub offer_number: String,
    pub title: String,
    pub lead_status: Option<LeadStatus>,
    pub next_action_date: Option<NaiveDate>,
    pub currency: String,
    pub salesperson_id: String,
    pub client_id: String,
    pub follow_up_notes: Option<String>,
}

/// A unit + quantity + price row owned by one offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferLineItem {
    pub id: String,
    pub offer_id: String,
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl LineItemInput {
    pub fn total_price(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCreateInput {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub contract_number: String,
    pub title: String,
    pub client_id: String,
    pub offer_id: Option<String>,
    pub status: ContractStatus,
    pub total_value: f64,
    pub currency: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCreateInput {
    pub contract_number: String,
    pub title: String,
    pub client_id: String,
    pub offer_id: Option<String>,
    pub status: ContractStatus,
    pub total_value: f64,
    pub currency: String,
    pub notes: Option<String>,
}

/// Salesperson who owns offers and receives reminder digests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalespersonProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

/// Immutable generated snapshot of an offer or contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: String,
    pub document_id: String,
    pub document_kind: DocumentKind,
    pub version_number: i64,
    pub storage_key: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    pub notes: Option<String>,
}

/// Append-only audit row for one email send of a document version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDeliveryRecord {
    pub id: String,
    pub document_version_id: String,
    pub sent_to: String,
    pub sent_by: String,
    pub status: DeliveryStatus,
    pub notes: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSubscription {
    pub id: String,
    pub report_type: String,
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub frequency: Frequency,
    pub enabled: bool,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubscriptionCreateInput {
    pub report_type: String,
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub frequency: Frequency,
}
