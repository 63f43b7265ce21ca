//! Immutable movement records: unit dispatches, transfers, sales, and
//! spare-part dispatches
//!
//! These records are never mutated or deleted after creation; they form
//! the append-only provenance trail folded by the lifecycle and stock
//! read paths.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Factory → dealer movement of one or more units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDispatch {
    pub id: Uuid,
    /// Caller-supplied unique number (e.g., a gate-pass number)
    pub dispatch_number: String,
    pub dealer_id: Uuid,
    pub dispatched_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Dealer → sub-dealer movement of already-dispatched units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTransfer {
    pub id: Uuid,
    pub dealer_id: Uuid,
    pub sub_dealer_id: Uuid,
    pub transferred_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Audit copy of a sale, duplicated from the unit's sale columns so the
/// trail survives independently of the live record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub invoice_no: String,
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub sold_by_dealer_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Factory → service-center dispatch of spare parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDispatch {
    pub id: Uuid,
    /// Year-scoped sequential number: PD-YYYY-NNNN
    pub dispatch_number: String,
    pub service_center_id: Uuid,
    pub dispatched_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// One line of a part dispatch — a consumable lot
///
/// `quantity` is the dispatched amount and never changes; consumption is
/// derived from REPLACEMENT records referencing this item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartDispatchItem {
    pub id: Uuid,
    pub dispatch_id: Uuid,
    pub part_code: String,
    pub part_name: String,
    pub quantity: i32,
}
