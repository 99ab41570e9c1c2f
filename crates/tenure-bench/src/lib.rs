//! Benchmark profiles for Tenure.
//!
//! - [`slot_churn`]: construct/borrow/reset cycles over fresh slots
//! - [`table_churn`]: insert/remove cycles that exercise free-list reuse

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tenure_slot::{BorrowView, OwnedSlot, SlotTable};

/// Run `rounds` full slot lifecycles, each with `views` outstanding views
/// dereferenced once before the free. Returns the sum of observed values.
pub fn slot_churn(rounds: u64, views: usize) -> u64 {
    let mut total = 0;
    for i in 0..rounds {
        let mut slot = OwnedSlot::new();
        if slot.construct(i).is_err() {
            continue;
        }
        let taken: Vec<BorrowView<u64>> = (0..views).filter_map(|_| slot.borrow().ok()).collect();
        total += taken.iter().filter_map(|v| v.deref().ok()).sum::<u64>();
        let _ = slot.reset();
    }
    total
}

/// Fill a table with `live` values, then remove and reinsert each one
/// `rounds` times. Returns the number of live values at the end.
pub fn table_churn(live: usize, rounds: usize) -> usize {
    let mut table = SlotTable::new();
    let mut handles: Vec<_> = (0..live).map(|i| table.insert(i)).collect();
    for _ in 0..rounds {
        for h in &mut handles {
            if let Ok(v) = table.remove(*h) {
                *h = table.insert(v);
            }
        }
    }
    table.len()
}
