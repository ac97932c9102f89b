// ABOUTME: Core types, error taxonomy and utilities for Robodesk
// ABOUTME: Foundational package shared by the pipeline, documents, notifications and API layers

pub mod constants;
pub mod error;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    Client, ClientCreateInput, Contract, ContractCreateInput, ContractStatus, DeliveryStatus,
    DocumentKind, DocumentVersion, EmailDeliveryRecord, Frequency, LeadStatus, LineItemInput,
    Offer, OfferCreateInput, OfferLineItem, ReportSubscription, ReportSubscriptionCreateInput,
    SalespersonProfile, Stage,
};

// Re-export errors
pub use error::{ServiceError, ServiceResult, Upstream};

// Re-export constants
pub use constants::{robodesk_dir, REMINDER_LOOKAHEAD_DAYS};

// Re-export utilities
pub use utils::{escape_html, generate_id};

// Re-export validation
pub use validation::{
    validate_email, validate_length, validate_required, validate_storage_key, ValidationError,
};
