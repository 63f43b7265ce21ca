//! Stock derivation
//!
//! Balances are never stored; they are folded from the parts ledger on
//! every read. Dispatch items add, REPLACEMENT records subtract. Repairs
//! never appear in the fold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Derived stock balance for one part at one service center
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockBalance {
    pub part_code: String,
    pub part_name: String,
    pub total_dispatched_qty: i64,
    pub used_qty: i64,
    pub remaining_qty: i64,
}

/// Fold dispatched and consumed quantities into per-part balances.
///
/// `dispatched` carries `(part_code, part_name, quantity)` rows from the
/// center's dispatch items; `used` carries `(part_code, quantity)` rows
/// from REPLACEMENT records drawn against those items. Output is sorted
/// by part code.
pub fn fold_balances(
    dispatched: impl IntoIterator<Item = (String, String, i64)>,
    used: impl IntoIterator<Item = (String, i64)>,
) -> Vec<StockBalance> {
    let mut totals: BTreeMap<String, (String, i64, i64)> = BTreeMap::new();

    for (part_code, part_name, qty) in dispatched {
        let entry = totals.entry(part_code).or_insert((part_name, 0, 0));
        entry.1 += qty;
    }

    for (part_code, qty) in used {
        // Usage against a part never dispatched to this center cannot
        // happen through the workflow; tolerate it in the fold anyway
        let entry = totals
            .entry(part_code)
            .or_insert((String::new(), 0, 0));
        entry.2 += qty;
    }

    totals
        .into_iter()
        .map(|(part_code, (part_name, total, used))| StockBalance {
            part_code,
            part_name,
            total_dispatched_qty: total,
            used_qty: used,
            remaining_qty: total - used,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(code: &str, name: &str, qty: i64) -> (String, String, i64) {
        (code.to_string(), name.to_string(), qty)
    }

    fn u(code: &str, qty: i64) -> (String, i64) {
        (code.to_string(), qty)
    }

    #[test]
    fn test_single_dispatch_and_usage() {
        let balances = fold_balances(vec![d("P-10", "MOSFET board", 5)], vec![u("P-10", 3)]);
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].total_dispatched_qty, 5);
        assert_eq!(balances[0].used_qty, 3);
        assert_eq!(balances[0].remaining_qty, 2);
    }

    #[test]
    fn test_multiple_dispatches_accumulate() {
        let balances = fold_balances(
            vec![d("P-10", "MOSFET board", 5), d("P-10", "MOSFET board", 7)],
            vec![u("P-10", 4)],
        );
        assert_eq!(balances[0].total_dispatched_qty, 12);
        assert_eq!(balances[0].remaining_qty, 8);
    }

    #[test]
    fn test_untouched_part_has_zero_usage() {
        let balances = fold_balances(vec![d("P-20", "Display unit", 3)], vec![]);
        assert_eq!(balances[0].used_qty, 0);
        assert_eq!(balances[0].remaining_qty, 3);
    }

    #[test]
    fn test_output_sorted_by_part_code() {
        let balances = fold_balances(
            vec![
                d("P-30", "Fan", 2),
                d("P-10", "MOSFET board", 5),
                d("P-20", "Display unit", 3),
            ],
            vec![],
        );
        let codes: Vec<_> = balances.iter().map(|b| b.part_code.as_str()).collect();
        assert_eq!(codes, vec!["P-10", "P-20", "P-30"]);
    }

    #[test]
    fn test_fold_is_pure() {
        let make = || {
            fold_balances(
                vec![d("P-10", "MOSFET board", 5), d("P-20", "Display unit", 3)],
                vec![u("P-10", 2)],
            )
        };
        assert_eq!(make(), make());
    }
}
