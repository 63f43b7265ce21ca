//! Custody lifecycle rules
//!
//! The custody of a unit is an explicit tagged state rather than a pile of
//! nullable columns, and every transition is validated by a total function
//! here before any write happens. Services run these guards over the whole
//! batch first (read-then-decide), so a failing serial rejects the batch
//! before anything mutates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CostLiability;
use crate::warranty::warranty_end;

/// Maximum REPLACEMENT entries per (unit, part code) over the unit's life.
/// Repairs do not count.
pub const REPLACEMENT_CAP: i64 = 2;

/// Who physically holds a unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Custody {
    Factory,
    Dealer,
    SubDealer,
}

impl Custody {
    pub fn as_str(&self) -> &'static str {
        match self {
            Custody::Factory => "factory",
            Custody::Dealer => "dealer",
            Custody::SubDealer => "sub_dealer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "factory" => Some(Custody::Factory),
            "dealer" => Some(Custody::Dealer),
            "sub_dealer" => Some(Custody::SubDealer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Custody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a lifecycle transition is blocked for a serial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionBlock {
    #[error("serial not found")]
    NotFound,
    #[error("unit already sold")]
    AlreadySold,
    #[error("unit already dispatched")]
    AlreadyDispatched,
    #[error("unit has not been dispatched")]
    NotDispatched,
    #[error("unit is not held by the acting dealer")]
    NotOwned,
    #[error("unit has not been sold")]
    NotSold,
}

impl TransitionBlock {
    /// Machine-readable reason code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            TransitionBlock::NotFound => "NOT_FOUND",
            TransitionBlock::AlreadySold => "ALREADY_SOLD",
            TransitionBlock::AlreadyDispatched => "ALREADY_DISPATCHED",
            TransitionBlock::NotDispatched => "NOT_DISPATCHED",
            TransitionBlock::NotOwned => "NOT_OWNED",
            TransitionBlock::NotSold => "NOT_SOLD",
        }
    }
}

/// Read-side snapshot of a unit's custody, taken before deciding a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustodySnapshot {
    pub custody: Custody,
    pub holder_dealer_id: Option<Uuid>,
    pub sold: bool,
}

/// The party attempting a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seller {
    /// Factory admin selling a unit still in factory custody (direct sale)
    Factory,
    /// Dealer or sub-dealer selling a unit it holds
    Dealer(Uuid),
}

/// A unit can be dispatched only from unsold factory custody
pub fn check_dispatchable(snapshot: &CustodySnapshot) -> Result<(), TransitionBlock> {
    if snapshot.sold {
        return Err(TransitionBlock::AlreadySold);
    }
    if snapshot.custody != Custody::Factory {
        return Err(TransitionBlock::AlreadyDispatched);
    }
    Ok(())
}

/// A unit can be transferred only while held unsold by the acting main dealer
pub fn check_transferable(
    snapshot: &CustodySnapshot,
    acting_dealer_id: Uuid,
) -> Result<(), TransitionBlock> {
    if snapshot.sold {
        return Err(TransitionBlock::AlreadySold);
    }
    match snapshot.custody {
        Custody::Factory => Err(TransitionBlock::NotDispatched),
        Custody::Dealer | Custody::SubDealer => {
            if snapshot.holder_dealer_id == Some(acting_dealer_id)
                && snapshot.custody == Custody::Dealer
            {
                Ok(())
            } else {
                Err(TransitionBlock::NotOwned)
            }
        }
    }
}

/// A sale requires an unsold unit held by the seller. The factory path
/// covers only units still in factory custody (direct factory sale).
pub fn check_sellable(snapshot: &CustodySnapshot, seller: &Seller) -> Result<(), TransitionBlock> {
    if snapshot.sold {
        return Err(TransitionBlock::AlreadySold);
    }
    match seller {
        Seller::Factory => {
            if snapshot.custody == Custody::Factory {
                Ok(())
            } else {
                Err(TransitionBlock::NotOwned)
            }
        }
        Seller::Dealer(dealer_id) => {
            if snapshot.custody == Custody::Factory {
                return Err(TransitionBlock::NotDispatched);
            }
            if snapshot.holder_dealer_id == Some(*dealer_id) {
                Ok(())
            } else {
                Err(TransitionBlock::NotOwned)
            }
        }
    }
}

/// Whether another REPLACEMENT is allowed given the number already recorded
/// for this (unit, part code)
pub fn replacement_cap_reached(prior_replacements: i64) -> bool {
    prior_replacements >= REPLACEMENT_CAP
}

/// Cost liability of a replacement: the factory pays while the part falls
/// inside the parts warranty window of the sale, the customer afterwards.
/// Returns the liability and whether the entry is warranty-claim eligible.
pub fn derive_cost_liability(
    sale_date: NaiveDate,
    parts_months: u32,
    replacement_date: NaiveDate,
) -> (CostLiability, bool) {
    if replacement_date <= warranty_end(sale_date, parts_months) {
        (CostLiability::Factory, true)
    } else {
        (CostLiability::Customer, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn in_factory() -> CustodySnapshot {
        CustodySnapshot {
            custody: Custody::Factory,
            holder_dealer_id: None,
            sold: false,
        }
    }

    fn with_dealer(id: Uuid) -> CustodySnapshot {
        CustodySnapshot {
            custody: Custody::Dealer,
            holder_dealer_id: Some(id),
            sold: false,
        }
    }

    #[test]
    fn test_dispatch_from_factory() {
        assert!(check_dispatchable(&in_factory()).is_ok());
    }

    #[test]
    fn test_dispatch_blocked_when_sold() {
        let mut s = in_factory();
        s.sold = true;
        assert_eq!(check_dispatchable(&s), Err(TransitionBlock::AlreadySold));
    }

    #[test]
    fn test_dispatch_blocked_when_already_dispatched() {
        let s = with_dealer(Uuid::new_v4());
        assert_eq!(
            check_dispatchable(&s),
            Err(TransitionBlock::AlreadyDispatched)
        );
    }

    #[test]
    fn test_transfer_by_holding_dealer() {
        let dealer = Uuid::new_v4();
        assert!(check_transferable(&with_dealer(dealer), dealer).is_ok());
    }

    #[test]
    fn test_transfer_blocked_for_other_dealer() {
        let s = with_dealer(Uuid::new_v4());
        assert_eq!(
            check_transferable(&s, Uuid::new_v4()),
            Err(TransitionBlock::NotOwned)
        );
    }

    #[test]
    fn test_transfer_blocked_before_dispatch() {
        assert_eq!(
            check_transferable(&in_factory(), Uuid::new_v4()),
            Err(TransitionBlock::NotDispatched)
        );
    }

    #[test]
    fn test_no_transfer_renesting_from_sub_dealer() {
        let sub = Uuid::new_v4();
        let s = CustodySnapshot {
            custody: Custody::SubDealer,
            holder_dealer_id: Some(sub),
            sold: false,
        };
        // Even the holding sub-dealer cannot transfer onward
        assert_eq!(check_transferable(&s, sub), Err(TransitionBlock::NotOwned));
    }

    #[test]
    fn test_sell_by_holder() {
        let dealer = Uuid::new_v4();
        assert!(check_sellable(&with_dealer(dealer), &Seller::Dealer(dealer)).is_ok());
    }

    #[test]
    fn test_sell_is_terminal() {
        let dealer = Uuid::new_v4();
        let mut s = with_dealer(dealer);
        s.sold = true;
        assert_eq!(
            check_sellable(&s, &Seller::Dealer(dealer)),
            Err(TransitionBlock::AlreadySold)
        );
        assert_eq!(
            check_dispatchable(&s),
            Err(TransitionBlock::AlreadySold)
        );
        assert_eq!(
            check_transferable(&s, dealer),
            Err(TransitionBlock::AlreadySold)
        );
    }

    #[test]
    fn test_direct_factory_sale() {
        assert!(check_sellable(&in_factory(), &Seller::Factory).is_ok());
    }

    #[test]
    fn test_factory_cannot_sell_dealer_held_unit() {
        let s = with_dealer(Uuid::new_v4());
        assert_eq!(
            check_sellable(&s, &Seller::Factory),
            Err(TransitionBlock::NotOwned)
        );
    }

    #[test]
    fn test_sub_dealer_sells_held_unit() {
        let sub = Uuid::new_v4();
        let s = CustodySnapshot {
            custody: Custody::SubDealer,
            holder_dealer_id: Some(sub),
            sold: false,
        };
        assert!(check_sellable(&s, &Seller::Dealer(sub)).is_ok());
    }

    #[test]
    fn test_replacement_cap() {
        assert!(!replacement_cap_reached(0));
        assert!(!replacement_cap_reached(1));
        assert!(replacement_cap_reached(2));
        assert!(replacement_cap_reached(3));
    }

    #[test]
    fn test_cost_liability_within_warranty() {
        let (liability, eligible) =
            derive_cost_liability(date(2025, 1, 10), 12, date(2025, 6, 1));
        assert_eq!(liability, CostLiability::Factory);
        assert!(eligible);
    }

    #[test]
    fn test_cost_liability_after_warranty() {
        let (liability, eligible) =
            derive_cost_liability(date(2025, 1, 10), 12, date(2026, 2, 1));
        assert_eq!(liability, CostLiability::Customer);
        assert!(!eligible);
    }

    #[test]
    fn test_cost_liability_on_boundary_day() {
        let (liability, eligible) =
            derive_cost_liability(date(2025, 1, 10), 12, date(2026, 1, 10));
        assert_eq!(liability, CostLiability::Factory);
        assert!(eligible);
    }
}
