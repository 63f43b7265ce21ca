//! Service workflow tests
//!
//! Covers the replacement cap, cost liability derivation, and the rules
//! that separate replacements (stock-consuming, capped) from repairs.

use chrono::NaiveDate;
use proptest::prelude::*;

use shared::lifecycle::{derive_cost_liability, replacement_cap_reached, REPLACEMENT_CAP};
use shared::models::CostLiability;
use shared::warranty::{assess_sold, warranty_end, WarrantyTerms};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_cap_allows_two_replacements_per_part() {
        assert!(!replacement_cap_reached(0));
        assert!(!replacement_cap_reached(1));
        assert!(replacement_cap_reached(2));
        assert_eq!(REPLACEMENT_CAP, 2);
    }

    #[test]
    fn test_factory_pays_inside_parts_warranty() {
        let (liability, eligible) =
            derive_cost_liability(date(2025, 1, 10), 12, date(2025, 8, 1));
        assert_eq!(liability, CostLiability::Factory);
        assert!(eligible);
    }

    #[test]
    fn test_customer_pays_after_parts_warranty() {
        let (liability, eligible) =
            derive_cost_liability(date(2025, 1, 10), 12, date(2026, 3, 1));
        assert_eq!(liability, CostLiability::Customer);
        assert!(!eligible);
    }

    #[test]
    fn test_liability_boundary_day_is_factory() {
        let end = warranty_end(date(2025, 1, 10), 12);
        let (liability, _) = derive_cost_liability(date(2025, 1, 10), 12, end);
        assert_eq!(liability, CostLiability::Factory);

        let day_after = end + chrono::Duration::days(1);
        let (liability, _) = derive_cost_liability(date(2025, 1, 10), 12, day_after);
        assert_eq!(liability, CostLiability::Customer);
    }

    #[test]
    fn test_service_type_follows_parts_window() {
        let terms = WarrantyTerms {
            parts_months: 12,
            service_months: 24,
        };
        let sold_on = date(2024, 1, 10);

        // Visit inside the parts window: free job
        let a = assess_sold(sold_on, &terms, date(2024, 6, 1));
        assert!(a.parts_in_warranty);

        // Visit after the parts window: paid job
        let b = assess_sold(sold_on, &terms, date(2026, 6, 1));
        assert!(!b.parts_in_warranty);
    }

    #[test]
    fn test_paid_job_while_service_window_still_open() {
        // Parts warranty expired but the longer service window has not:
        // the job is still paid, because free service keys on parts
        let terms = WarrantyTerms {
            parts_months: 12,
            service_months: 24,
        };
        let a = assess_sold(date(2025, 1, 10), &terms, date(2026, 2, 1));
        assert!(!a.parts_in_warranty);
        assert!(a.service_in_warranty);
    }

    #[test]
    fn test_zero_month_parts_warranty() {
        let sold_on = date(2025, 5, 1);
        // Replacement on the sale day itself is still factory-paid
        let (liability, _) = derive_cost_liability(sold_on, 0, sold_on);
        assert_eq!(liability, CostLiability::Factory);

        let (liability, _) = derive_cost_liability(sold_on, 0, date(2025, 5, 2));
        assert_eq!(liability, CostLiability::Customer);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (2015i32..2035, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Liability and claim eligibility always agree
        #[test]
        fn prop_eligibility_matches_liability(
            sale in date_strategy(),
            months in 0u32..=120,
            replacement in date_strategy()
        ) {
            let (liability, eligible) = derive_cost_liability(sale, months, replacement);
            prop_assert_eq!(eligible, liability == CostLiability::Factory);
        }

        /// Liability flips from factory to customer exactly once over time
        #[test]
        fn prop_liability_monotone_over_time(
            sale in date_strategy(),
            months in 0u32..=120,
            replacement in date_strategy(),
            extra_days in 1i64..=3650
        ) {
            let (earlier, _) = derive_cost_liability(sale, months, replacement);
            let later_date = replacement + chrono::Duration::days(extra_days);
            let (later, _) = derive_cost_liability(sale, months, later_date);

            // Once the customer pays, the factory never pays again
            if earlier == CostLiability::Customer {
                prop_assert_eq!(later, CostLiability::Customer);
            }
        }

        /// The cap is a pure threshold on the prior count
        #[test]
        fn prop_cap_is_threshold(prior in 0i64..=100) {
            prop_assert_eq!(replacement_cap_reached(prior), prior >= REPLACEMENT_CAP);
        }

        /// Liability derivation agrees with the warranty engine's window
        #[test]
        fn prop_liability_matches_warranty_window(
            sale in date_strategy(),
            months in 0u32..=120,
            replacement in date_strategy()
        ) {
            let (liability, _) = derive_cost_liability(sale, months, replacement);
            let in_window = replacement <= warranty_end(sale, months);
            prop_assert_eq!(liability == CostLiability::Factory, in_window);
        }
    }
}
