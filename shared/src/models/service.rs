//! Service jobs and part replacement records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a service entry consumed a physical spare part
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementType {
    /// Consumes stock from a dispatch lot and counts toward the cap
    Replacement,
    /// In-place fix; no stock movement, no cap
    Repair,
}

impl ReplacementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementType::Replacement => "replacement",
            ReplacementType::Repair => "repair",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "replacement" => Some(ReplacementType::Replacement),
            "repair" => Some(ReplacementType::Repair),
            _ => None,
        }
    }
}

/// Who bears the cost of a replacement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostLiability {
    Factory,
    Customer,
}

impl CostLiability {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostLiability::Factory => "factory",
            CostLiability::Customer => "customer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "factory" => Some(CostLiability::Factory),
            "customer" => Some(CostLiability::Customer),
            _ => None,
        }
    }
}

/// Billing class of a service visit, derived from the warranty snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Free,
    Paid,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Free => "free",
            ServiceType::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(ServiceType::Free),
            "paid" => Some(ServiceType::Paid),
            _ => None,
        }
    }
}

/// One service visit for a sold unit
///
/// The warranty columns are frozen at creation time — they record what was
/// true at `visit_date` and are never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceJob {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub service_center_id: Uuid,
    pub reported_fault: String,
    pub visit_date: NaiveDate,
    pub parts_in_warranty: bool,
    pub service_in_warranty: bool,
    pub parts_warranty_until: NaiveDate,
    pub service_warranty_until: NaiveDate,
    pub service_type: ServiceType,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of a part replaced (or repaired) during a service job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacedPart {
    pub id: Uuid,
    pub service_job_id: Uuid,
    pub unit_id: Uuid,
    /// Source lot line; None for repairs
    pub part_dispatch_item_id: Option<Uuid>,
    pub part_code: String,
    pub quantity: i32,
    pub replacement_type: ReplacementType,
    pub cost_liability: CostLiability,
    pub warranty_claim_eligible: bool,
    /// Amount charged when the customer bears the cost
    pub charge_amount: Option<Decimal>,
    pub replacement_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
