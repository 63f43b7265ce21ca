//! Reference data: inverter models and the spare-parts catalog

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::warranty::WarrantyTerms;

/// An inverter model with its warranty terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InverterModel {
    pub id: Uuid,
    pub brand: String,
    /// Unique short code (e.g., "NX-3000")
    pub model_code: String,
    pub name: String,
    pub capacity_kva: Decimal,
    pub parts_warranty_months: i32,
    pub service_warranty_months: i32,
    pub created_at: DateTime<Utc>,
}

impl InverterModel {
    /// Warranty terms carried by this model
    pub fn warranty_terms(&self) -> WarrantyTerms {
        WarrantyTerms {
            parts_months: self.parts_warranty_months.max(0) as u32,
            service_months: self.service_warranty_months.max(0) as u32,
        }
    }
}

/// A spare part in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub part_code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
