//! Derived stock tests
//!
//! Stock is a pure fold over the parts ledger: dispatch items add,
//! REPLACEMENT usage subtracts, and nothing is ever stored.

use proptest::prelude::*;

use shared::stock::fold_balances;
use shared::validation::{format_part_dispatch_number, validate_part_dispatch_number};

fn d(code: &str, name: &str, qty: i64) -> (String, String, i64) {
    (code.to_string(), name.to_string(), qty)
}

fn u(code: &str, qty: i64) -> (String, i64) {
    (code.to_string(), qty)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_remaining_is_dispatched_minus_used() {
        let balances = fold_balances(
            vec![d("P-10", "MOSFET board", 10), d("P-20", "Fan", 4)],
            vec![u("P-10", 3)],
        );

        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].part_code, "P-10");
        assert_eq!(balances[0].remaining_qty, 7);
        assert_eq!(balances[1].part_code, "P-20");
        assert_eq!(balances[1].remaining_qty, 4);
    }

    #[test]
    fn test_multiple_lots_of_same_part_accumulate() {
        let balances = fold_balances(
            vec![d("P-10", "MOSFET board", 5), d("P-10", "MOSFET board", 7)],
            vec![u("P-10", 6)],
        );

        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].total_dispatched_qty, 12);
        assert_eq!(balances[0].used_qty, 6);
        assert_eq!(balances[0].remaining_qty, 6);
    }

    #[test]
    fn test_empty_ledger_folds_to_nothing() {
        let balances = fold_balances(Vec::new(), Vec::new());
        assert!(balances.is_empty());
    }

    #[test]
    fn test_fully_consumed_lot_reads_zero() {
        let balances = fold_balances(vec![d("P-10", "MOSFET board", 5)], vec![u("P-10", 5)]);
        assert_eq!(balances[0].remaining_qty, 0);
    }

    #[test]
    fn test_dispatch_numbers_round_trip() {
        for seq in [1, 42, 9999, 10000] {
            let number = format_part_dispatch_number(2025, seq);
            assert!(validate_part_dispatch_number(&number).is_ok());
        }
    }

    #[test]
    fn test_dispatch_number_sequence_is_zero_padded() {
        assert_eq!(format_part_dispatch_number(2025, 7), "PD-2025-0007");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn part_code_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("P-10".to_string()),
            Just("P-20".to_string()),
            Just("P-30".to_string()),
            Just("IGBT-45A".to_string()),
        ]
    }

    fn dispatched_strategy() -> impl Strategy<Value = Vec<(String, String, i64)>> {
        prop::collection::vec(
            (part_code_strategy(), 1i64..=100).prop_map(|(code, qty)| {
                let name = format!("{} part", code);
                (code, name, qty)
            }),
            0..20,
        )
    }

    fn used_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
        prop::collection::vec((part_code_strategy(), 1i64..=50), 0..20)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Per-part conservation: remaining + used = dispatched
        #[test]
        fn prop_balances_conserve_quantities(
            dispatched in dispatched_strategy(),
            used in used_strategy()
        ) {
            let balances = fold_balances(dispatched.clone(), used.clone());

            for balance in &balances {
                prop_assert_eq!(
                    balance.remaining_qty + balance.used_qty,
                    balance.total_dispatched_qty
                );

                let expected_dispatched: i64 = dispatched
                    .iter()
                    .filter(|(code, _, _)| code == &balance.part_code)
                    .map(|(_, _, qty)| qty)
                    .sum();
                prop_assert_eq!(balance.total_dispatched_qty, expected_dispatched);

                let expected_used: i64 = used
                    .iter()
                    .filter(|(code, _)| code == &balance.part_code)
                    .map(|(_, qty)| qty)
                    .sum();
                prop_assert_eq!(balance.used_qty, expected_used);
            }
        }

        /// Output is sorted by part code with no duplicates
        #[test]
        fn prop_output_sorted_and_unique(
            dispatched in dispatched_strategy(),
            used in used_strategy()
        ) {
            let balances = fold_balances(dispatched, used);
            for pair in balances.windows(2) {
                prop_assert!(pair[0].part_code < pair[1].part_code);
            }
        }

        /// The fold is deterministic
        #[test]
        fn prop_fold_deterministic(
            dispatched in dispatched_strategy(),
            used in used_strategy()
        ) {
            let a = fold_balances(dispatched.clone(), used.clone());
            let b = fold_balances(dispatched, used);
            prop_assert_eq!(a, b);
        }

        /// Usage order never changes the result
        #[test]
        fn prop_fold_order_independent(
            dispatched in dispatched_strategy(),
            used in used_strategy()
        ) {
            let mut reversed_dispatched = dispatched.clone();
            reversed_dispatched.reverse();
            let mut reversed_used = used.clone();
            reversed_used.reverse();

            let a = fold_balances(dispatched, used);
            let b = fold_balances(reversed_dispatched, reversed_used);
            prop_assert_eq!(a, b);
        }

        /// Generated dispatch numbers always validate
        #[test]
        fn prop_dispatch_numbers_validate(year in 1000i32..=9999, seq in 1i64..=999999) {
            let number = format_part_dispatch_number(year, seq);
            prop_assert!(validate_part_dispatch_number(&number).is_ok());
        }
    }
}
