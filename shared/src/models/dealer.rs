//! Dealer network and service center models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dealer in the distribution network
///
/// A dealer with `parent_dealer_id == None` is a main dealer supplied
/// directly by the factory; otherwise it is a sub-dealer of that parent.
/// Sub-dealers cannot have children of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dealer {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub contact_phone: Option<String>,
    pub parent_dealer_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Dealer {
    pub fn is_main_dealer(&self) -> bool {
        self.parent_dealer_id.is_none()
    }
}

/// A factory-authorized service center holding spare-parts stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCenter {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
