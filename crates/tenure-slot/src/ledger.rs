//! Allocation ledger for tracked slots.
//!
//! A [`Ledger`] records every lifecycle event of the slots registered with
//! it. Its main job is leak accounting: Rust always drops a value when its
//! owner goes out of scope, so a tracked slot that is dropped while still
//! `Live` is reported as a leak, i.e. a path that never released the value
//! explicitly.
//!
//! Ledgers are cheap to clone; clones share the same underlying record.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tenure_core::{Generation, SlotId, SlotStatus};

/// A lifecycle event recorded for a tracked slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    /// The slot received a value.
    Constructed,
    /// The value was moved out to a new owner.
    Released {
        /// Generation after the transition.
        generation: Generation,
    },
    /// The value was destroyed in place.
    Reset {
        /// Generation after the transition.
        generation: Generation,
    },
    /// The slot went out of scope while still owning its value.
    DroppedLive,
}

/// Everything the ledger knows about one tracked slot.
#[derive(Clone, Debug)]
pub struct LedgerEntry {
    /// Human-readable name given at registration.
    pub label: String,
    /// Last status observed by the ledger.
    pub status: SlotStatus,
    /// Events in the order they happened. Slots rarely see more than a
    /// handful, so the history lives inline.
    pub history: SmallVec<[LedgerEvent; 4]>,
}

impl LedgerEntry {
    /// Whether this slot was dropped while live.
    pub fn leaked(&self) -> bool {
        self.history.contains(&LedgerEvent::DroppedLive)
    }
}

/// Aggregate counters over a ledger, taken at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Number of values stored into tracked slots.
    pub allocations: u64,
    /// Number of explicit releases and resets.
    pub frees: u64,
    /// Number of tracked slots dropped while live.
    pub leaks: u64,
    /// Number of tracked slots currently live.
    pub live: u64,
}

#[derive(Default)]
struct LedgerState {
    entries: IndexMap<SlotId, LedgerEntry>,
    allocations: u64,
    frees: u64,
    leaks: u64,
}

/// Shared, single-threaded record of tracked slot lifecycles.
#[derive(Clone, Default)]
pub struct Ledger {
    state: Rc<RefCell<LedgerState>>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a slot under `label`. Registration order is preserved.
    pub(crate) fn register(&self, slot: SlotId, label: String, status: SlotStatus) {
        let mut state = self.state.borrow_mut();
        let mut history = SmallVec::new();
        if status.is_live() {
            history.push(LedgerEvent::Constructed);
            state.allocations += 1;
        }
        state.entries.insert(
            slot,
            LedgerEntry {
                label,
                status,
                history,
            },
        );
    }

    /// Record an event for a registered slot. Unknown slots are ignored.
    pub(crate) fn record(&self, slot: SlotId, event: LedgerEvent) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(entry) = state.entries.get_mut(&slot) else {
            return;
        };
        entry.status = match event {
            LedgerEvent::Constructed => {
                state.allocations += 1;
                SlotStatus::Live
            }
            LedgerEvent::Released { .. } | LedgerEvent::Reset { .. } => {
                state.frees += 1;
                SlotStatus::Freed
            }
            LedgerEvent::DroppedLive => {
                state.leaks += 1;
                SlotStatus::Live
            }
        };
        entry.history.push(event);
    }

    /// Number of values stored into tracked slots.
    pub fn allocations(&self) -> u64 {
        self.state.borrow().allocations
    }

    /// Number of explicit frees.
    pub fn frees(&self) -> u64 {
        self.state.borrow().frees
    }

    /// Labels of slots dropped while live, in registration order.
    pub fn leaks(&self) -> Vec<String> {
        self.state
            .borrow()
            .entries
            .values()
            .filter(|e| e.leaked())
            .map(|e| e.label.clone())
            .collect()
    }

    /// Labels of slots whose last recorded status is `Live` and that
    /// have not been reported as leaked.
    pub fn live_labels(&self) -> Vec<String> {
        self.state
            .borrow()
            .entries
            .values()
            .filter(|e| e.status.is_live() && !e.leaked())
            .map(|e| e.label.clone())
            .collect()
    }

    /// Look up the entry registered under `label` (first match).
    pub fn entry(&self, label: &str) -> Option<LedgerEntry> {
        self.state
            .borrow()
            .entries
            .values()
            .find(|e| e.label == label)
            .cloned()
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Whether no slot has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the aggregate counters.
    pub fn summary(&self) -> LedgerSummary {
        let state = self.state.borrow();
        let live = state
            .entries
            .values()
            .filter(|e| e.status.is_live() && !e.leaked())
            .count() as u64;
        LedgerSummary {
            allocations: state.allocations,
            frees: state.frees,
            leaks: state.leaks,
            live,
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("summary", &self.summary())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_record() {
        let ledger = Ledger::new();
        let id = SlotId::next();
        ledger.register(id, "buffer".into(), SlotStatus::Empty);
        ledger.record(id, LedgerEvent::Constructed);
        ledger.record(
            id,
            LedgerEvent::Reset {
                generation: Generation(1),
            },
        );

        let entry = ledger.entry("buffer").unwrap();
        assert_eq!(entry.status, SlotStatus::Freed);
        assert_eq!(entry.history.len(), 2);
        assert!(!entry.leaked());
        assert_eq!(ledger.allocations(), 1);
        assert_eq!(ledger.frees(), 1);
        assert!(ledger.leaks().is_empty());
    }

    #[test]
    fn dropped_live_is_a_leak() {
        let ledger = Ledger::new();
        let id = SlotId::next();
        ledger.register(id, "data".into(), SlotStatus::Live);
        ledger.record(id, LedgerEvent::DroppedLive);

        assert_eq!(ledger.leaks(), vec!["data".to_string()]);
        assert!(ledger.live_labels().is_empty());
        let summary = ledger.summary();
        assert_eq!(summary.allocations, 1);
        assert_eq!(summary.leaks, 1);
        assert_eq!(summary.live, 0);
    }

    #[test]
    fn clones_share_state() {
        let a = Ledger::new();
        let b = a.clone();
        a.register(SlotId::next(), "x".into(), SlotStatus::Live);
        assert_eq!(b.len(), 1);
        assert_eq!(b.live_labels(), vec!["x".to_string()]);
    }

    #[test]
    fn unknown_slot_events_are_ignored() {
        let ledger = Ledger::new();
        ledger.record(SlotId::next(), LedgerEvent::Constructed);
        assert!(ledger.is_empty());
        assert_eq!(ledger.allocations(), 0);
    }
}
