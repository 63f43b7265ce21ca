//! Warranty engine
//!
//! Pure calendar-month warranty computation. Live queries call [`assess`]
//! with today's date; the service-job workflow calls it with the visit
//! date and freezes the result. A frozen snapshot is never recomputed —
//! it records what was true at the visit.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Warranty terms attached to an inverter model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WarrantyTerms {
    pub parts_months: u32,
    pub service_months: u32,
}

/// Result of assessing a unit's warranty at a reference date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WarrantyStatus {
    /// Unit has no sale date; warranty-gated operations must reject
    NotSold,
    Assessed(WarrantyAssessment),
}

/// Warranty windows relative to a reference date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WarrantyAssessment {
    pub parts_in_warranty: bool,
    pub service_in_warranty: bool,
    pub parts_until: NaiveDate,
    pub service_until: NaiveDate,
}

/// End of a warranty window: sale date plus a whole number of calendar
/// months (contract terms are month-based, not day-based). Chrono clamps
/// to the last day of a shorter target month (Jan 31 + 1 month = Feb 28).
pub fn warranty_end(sale_date: NaiveDate, months: u32) -> NaiveDate {
    sale_date
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Assess warranty status at `reference`. The end date itself is still in
/// warranty (inclusive comparison).
pub fn assess(
    sale_date: Option<NaiveDate>,
    terms: &WarrantyTerms,
    reference: NaiveDate,
) -> WarrantyStatus {
    match sale_date {
        None => WarrantyStatus::NotSold,
        Some(sold_on) => WarrantyStatus::Assessed(assess_sold(sold_on, terms, reference)),
    }
}

/// Assess a unit known to be sold
pub fn assess_sold(
    sale_date: NaiveDate,
    terms: &WarrantyTerms,
    reference: NaiveDate,
) -> WarrantyAssessment {
    let parts_until = warranty_end(sale_date, terms.parts_months);
    let service_until = warranty_end(sale_date, terms.service_months);

    WarrantyAssessment {
        parts_in_warranty: reference <= parts_until,
        service_in_warranty: reference <= service_until,
        parts_until,
        service_until,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TERMS: WarrantyTerms = WarrantyTerms {
        parts_months: 12,
        service_months: 24,
    };

    #[test]
    fn test_not_sold() {
        assert_eq!(
            assess(None, &TERMS, date(2025, 6, 1)),
            WarrantyStatus::NotSold
        );
    }

    #[test]
    fn test_within_both_windows() {
        let status = assess_sold(date(2025, 1, 10), &TERMS, date(2025, 6, 1));
        assert!(status.parts_in_warranty);
        assert!(status.service_in_warranty);
        assert_eq!(status.parts_until, date(2026, 1, 10));
        assert_eq!(status.service_until, date(2027, 1, 10));
    }

    #[test]
    fn test_parts_expired_service_active() {
        let status = assess_sold(date(2025, 1, 10), &TERMS, date(2026, 2, 1));
        assert!(!status.parts_in_warranty);
        assert!(status.service_in_warranty);
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let status = assess_sold(date(2025, 1, 10), &TERMS, date(2026, 1, 10));
        assert!(status.parts_in_warranty);

        let day_after = assess_sold(date(2025, 1, 10), &TERMS, date(2026, 1, 11));
        assert!(!day_after.parts_in_warranty);
    }

    #[test]
    fn test_month_end_clamping() {
        // Jan 31 + 1 month clamps to Feb 28 (non-leap year)
        assert_eq!(warranty_end(date(2025, 1, 31), 1), date(2025, 2, 28));
        // Leap year
        assert_eq!(warranty_end(date(2024, 1, 31), 1), date(2024, 2, 29));
    }

    #[test]
    fn test_zero_month_terms() {
        let terms = WarrantyTerms {
            parts_months: 0,
            service_months: 0,
        };
        let sold = date(2025, 3, 15);
        let status = assess_sold(sold, &terms, sold);
        // Sale day itself is still covered under a zero-month term
        assert!(status.parts_in_warranty);
        let next_day = assess_sold(sold, &terms, date(2025, 3, 16));
        assert!(!next_day.parts_in_warranty);
    }

    #[test]
    fn test_assessment_is_deterministic() {
        let a = assess_sold(date(2025, 1, 10), &TERMS, date(2025, 6, 1));
        let b = assess_sold(date(2025, 1, 10), &TERMS, date(2025, 6, 1));
        assert_eq!(a, b);
    }
}
