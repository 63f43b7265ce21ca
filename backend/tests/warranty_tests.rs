//! Warranty engine tests
//!
//! Covers calendar-month window arithmetic and the freeze semantics used
//! by service jobs: an assessment at a fixed reference date never changes,
//! while the live view moves with today's date.

use chrono::NaiveDate;
use proptest::prelude::*;

use shared::warranty::{assess, assess_sold, warranty_end, WarrantyStatus, WarrantyTerms};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    const TERMS: WarrantyTerms = WarrantyTerms {
        parts_months: 12,
        service_months: 24,
    };

    #[test]
    fn test_unsold_unit_has_no_assessment() {
        assert_eq!(
            assess(None, &TERMS, date(2025, 6, 1)),
            WarrantyStatus::NotSold
        );
    }

    #[test]
    fn test_windows_are_independent() {
        // 13 months after sale: parts expired, service still active
        let a = assess_sold(date(2025, 1, 15), &TERMS, date(2026, 2, 20));
        assert!(!a.parts_in_warranty);
        assert!(a.service_in_warranty);
    }

    #[test]
    fn test_end_date_inclusive() {
        let on_boundary = assess_sold(date(2025, 1, 10), &TERMS, date(2026, 1, 10));
        assert!(on_boundary.parts_in_warranty);

        let past_boundary = assess_sold(date(2025, 1, 10), &TERMS, date(2026, 1, 11));
        assert!(!past_boundary.parts_in_warranty);
    }

    #[test]
    fn test_month_end_clamp() {
        assert_eq!(warranty_end(date(2025, 1, 31), 1), date(2025, 2, 28));
        assert_eq!(warranty_end(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(warranty_end(date(2025, 8, 31), 3), date(2025, 11, 30));
    }

    #[test]
    fn test_frozen_snapshot_differs_from_live_view() {
        let sold_on = date(2024, 1, 10);
        // Visit happened while parts warranty was active
        let at_visit = assess_sold(sold_on, &TERMS, date(2024, 12, 1));
        assert!(at_visit.parts_in_warranty);

        // A later live read sees it expired; the frozen value is unchanged
        let later = assess_sold(sold_on, &TERMS, date(2025, 6, 1));
        assert!(!later.parts_in_warranty);
        assert!(at_visit.parts_in_warranty);
    }

    #[test]
    fn test_visit_on_sale_day() {
        let sold_on = date(2025, 3, 1);
        let a = assess_sold(sold_on, &TERMS, sold_on);
        assert!(a.parts_in_warranty);
        assert!(a.service_in_warranty);
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

    fn terms_strategy() -> impl Strategy<Value = WarrantyTerms> {
        (0u32..=120, 0u32..=120).prop_map(|(parts_months, service_months)| WarrantyTerms {
            parts_months,
            service_months,
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The warranty end never precedes the sale date
        #[test]
        fn prop_end_not_before_sale(sale in date_strategy(), months in 0u32..=120) {
            prop_assert!(warranty_end(sale, months) >= sale);
        }

        /// More months never shortens the window
        #[test]
        fn prop_end_monotone_in_months(sale in date_strategy(), months in 0u32..=119) {
            prop_assert!(warranty_end(sale, months + 1) >= warranty_end(sale, months));
        }

        /// Assessment at the same reference is deterministic
        #[test]
        fn prop_assessment_deterministic(
            sale in date_strategy(),
            terms in terms_strategy(),
            reference in date_strategy()
        ) {
            let a = assess_sold(sale, &terms, reference);
            let b = assess_sold(sale, &terms, reference);
            prop_assert_eq!(a, b);
        }

        /// In-warranty flags agree with the inclusive end-date comparison
        #[test]
        fn prop_flags_match_end_dates(
            sale in date_strategy(),
            terms in terms_strategy(),
            reference in date_strategy()
        ) {
            let a = assess_sold(sale, &terms, reference);
            prop_assert_eq!(a.parts_in_warranty, reference <= a.parts_until);
            prop_assert_eq!(a.service_in_warranty, reference <= a.service_until);
        }

        /// Once expired, a warranty stays expired at any later reference
        #[test]
        fn prop_expiry_is_monotone(
            sale in date_strategy(),
            terms in terms_strategy(),
            reference in date_strategy(),
            extra_days in 1i64..=3650
        ) {
            let now = assess_sold(sale, &terms, reference);
            let later_date = reference + chrono::Duration::days(extra_days);
            let later = assess_sold(sale, &terms, later_date);
            if !now.parts_in_warranty {
                prop_assert!(!later.parts_in_warranty);
            }
            if !now.service_in_warranty {
                prop_assert!(!later.service_in_warranty);
            }
        }
    }
}
