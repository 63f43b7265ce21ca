//! Custody lifecycle tests
//!
//! Covers the transition guards that gate every batch operation:
//! - A sale is terminal: no transition ever applies to a sold unit
//! - Dispatch only from factory custody
//! - Transfer only by the holding main dealer, never onward from a sub-dealer
//! - Sales require the seller to hold the unit

use proptest::prelude::*;
use uuid::Uuid;

use shared::lifecycle::{
    check_dispatchable, check_sellable, check_transferable, Custody, CustodySnapshot, Seller,
    TransitionBlock,
};

fn snapshot(custody: Custody, holder: Option<Uuid>, sold: bool) -> CustodySnapshot {
    CustodySnapshot {
        custody,
        holder_dealer_id: holder,
        sold,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_factory_unit_is_dispatchable() {
        let s = snapshot(Custody::Factory, None, false);
        assert!(check_dispatchable(&s).is_ok());
    }

    #[test]
    fn test_dispatched_unit_cannot_be_dispatched_again() {
        let s = snapshot(Custody::Dealer, Some(Uuid::new_v4()), false);
        assert_eq!(
            check_dispatchable(&s),
            Err(TransitionBlock::AlreadyDispatched)
        );
    }

    #[test]
    fn test_transfer_requires_prior_dispatch() {
        let s = snapshot(Custody::Factory, None, false);
        assert_eq!(
            check_transferable(&s, Uuid::new_v4()),
            Err(TransitionBlock::NotDispatched)
        );
    }

    #[test]
    fn test_transfer_by_non_holder_is_blocked() {
        let holder = Uuid::new_v4();
        let s = snapshot(Custody::Dealer, Some(holder), false);
        assert_eq!(
            check_transferable(&s, Uuid::new_v4()),
            Err(TransitionBlock::NotOwned)
        );
        assert!(check_transferable(&s, holder).is_ok());
    }

    #[test]
    fn test_sub_dealer_cannot_transfer_onward() {
        let sub = Uuid::new_v4();
        let s = snapshot(Custody::SubDealer, Some(sub), false);
        assert_eq!(check_transferable(&s, sub), Err(TransitionBlock::NotOwned));
    }

    #[test]
    fn test_dealer_sells_held_unit() {
        let dealer = Uuid::new_v4();
        let s = snapshot(Custody::Dealer, Some(dealer), false);
        assert!(check_sellable(&s, &Seller::Dealer(dealer)).is_ok());
    }

    #[test]
    fn test_sub_dealer_sells_held_unit() {
        let sub = Uuid::new_v4();
        let s = snapshot(Custody::SubDealer, Some(sub), false);
        assert!(check_sellable(&s, &Seller::Dealer(sub)).is_ok());
    }

    #[test]
    fn test_dealer_cannot_sell_undispatched_unit() {
        let s = snapshot(Custody::Factory, None, false);
        assert_eq!(
            check_sellable(&s, &Seller::Dealer(Uuid::new_v4())),
            Err(TransitionBlock::NotDispatched)
        );
    }

    #[test]
    fn test_factory_direct_sale_from_factory_custody_only() {
        let in_factory = snapshot(Custody::Factory, None, false);
        assert!(check_sellable(&in_factory, &Seller::Factory).is_ok());

        let with_dealer = snapshot(Custody::Dealer, Some(Uuid::new_v4()), false);
        assert_eq!(
            check_sellable(&with_dealer, &Seller::Factory),
            Err(TransitionBlock::NotOwned)
        );
    }

    #[test]
    fn test_main_dealer_cannot_sell_unit_held_by_its_sub_dealer() {
        let main = Uuid::new_v4();
        let sub = Uuid::new_v4();
        let s = snapshot(Custody::SubDealer, Some(sub), false);
        assert_eq!(
            check_sellable(&s, &Seller::Dealer(main)),
            Err(TransitionBlock::NotOwned)
        );
    }

    #[test]
    fn test_block_codes_are_stable() {
        assert_eq!(TransitionBlock::AlreadySold.code(), "ALREADY_SOLD");
        assert_eq!(TransitionBlock::AlreadyDispatched.code(), "ALREADY_DISPATCHED");
        assert_eq!(TransitionBlock::NotDispatched.code(), "NOT_DISPATCHED");
        assert_eq!(TransitionBlock::NotOwned.code(), "NOT_OWNED");
        assert_eq!(TransitionBlock::NotSold.code(), "NOT_SOLD");
        assert_eq!(TransitionBlock::NotFound.code(), "NOT_FOUND");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn custody_strategy() -> impl Strategy<Value = Custody> {
        prop_oneof![
            Just(Custody::Factory),
            Just(Custody::Dealer),
            Just(Custody::SubDealer),
        ]
    }

    fn snapshot_strategy() -> impl Strategy<Value = CustodySnapshot> {
        (custody_strategy(), any::<bool>()).prop_map(|(custody, sold)| {
            // Non-factory custody always has a holder
            let holder = match custody {
                Custody::Factory => None,
                Custody::Dealer | Custody::SubDealer => Some(Uuid::new_v4()),
            };
            CustodySnapshot {
                custody,
                holder_dealer_id: holder,
                sold,
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A sold unit blocks every transition, whatever its custody
        #[test]
        fn prop_sale_is_terminal(s in snapshot_strategy()) {
            if s.sold {
                prop_assert_eq!(check_dispatchable(&s), Err(TransitionBlock::AlreadySold));
                prop_assert_eq!(
                    check_transferable(&s, Uuid::new_v4()),
                    Err(TransitionBlock::AlreadySold)
                );
                prop_assert_eq!(
                    check_sellable(&s, &Seller::Factory),
                    Err(TransitionBlock::AlreadySold)
                );
            }
        }

        /// Only factory custody is dispatchable
        #[test]
        fn prop_dispatch_only_from_factory(s in snapshot_strategy()) {
            let result = check_dispatchable(&s);
            if !s.sold && s.custody == Custody::Factory {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(result.is_err());
            }
        }

        /// A transfer succeeds only for the holding main dealer
        #[test]
        fn prop_transfer_requires_holding_main_dealer(s in snapshot_strategy()) {
            let actor = Uuid::new_v4();
            let result = check_transferable(&s, actor);
            let should_pass = !s.sold
                && s.custody == Custody::Dealer
                && s.holder_dealer_id == Some(actor);
            prop_assert_eq!(result.is_ok(), should_pass);
        }

        /// The guards never mutate their input
        #[test]
        fn prop_guards_are_pure(s in snapshot_strategy()) {
            let before = s;
            let _ = check_dispatchable(&s);
            let _ = check_transferable(&s, Uuid::new_v4());
            let _ = check_sellable(&s, &Seller::Factory);
            prop_assert_eq!(s, before);
        }
    }
}
