//! Serialized unit model and its ownership event log

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::Custody;

/// One physical serialized inverter
///
/// `custody` is the live state used for conditional updates; every change
/// to it is mirrored by an [`OwnershipEvent`] written in the same
/// transaction, so the audit trail and the live view cannot diverge.
/// The sale columns are immutable once set — a sale is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub serial_number: String,
    pub model_id: Uuid,
    pub custody: Custody,
    /// Holding dealer or sub-dealer; None while in factory custody
    pub holder_dealer_id: Option<Uuid>,
    /// Dispatch that moved the unit out of the factory, if any
    pub dispatch_id: Option<Uuid>,
    pub sale_invoice_no: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    /// Dealer that made the sale; None for a direct factory sale
    pub sold_by_dealer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    pub fn is_sold(&self) -> bool {
        self.sale_date.is_some()
    }
}

/// Append-only ownership provenance record for a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipEvent {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub event_type: OwnershipEventType,
    /// Party the unit left (display name resolved at write time)
    pub from_party: Option<String>,
    /// Party the unit moved to
    pub to_party: Option<String>,
    /// Dispatch/transfer/sale record backing this event
    pub reference_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

/// Kind of ownership transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipEventType {
    Registered,
    Dispatched,
    Transferred,
    Sold,
}

impl OwnershipEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnershipEventType::Registered => "registered",
            OwnershipEventType::Dispatched => "dispatched",
            OwnershipEventType::Transferred => "transferred",
            OwnershipEventType::Sold => "sold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(OwnershipEventType::Registered),
            "dispatched" => Some(OwnershipEventType::Dispatched),
            "transferred" => Some(OwnershipEventType::Transferred),
            "sold" => Some(OwnershipEventType::Sold),
            _ => None,
        }
    }
}
