//! The owning slot.
//!
//! [`OwnedSlot`] wraps a single heap value and enforces single-owner
//! discipline through status transitions:
//!
//! | operation   | Empty             | Live                 | Freed          |
//! |-------------|-------------------|----------------------|----------------|
//! | `construct` | → Live            | `AlreadyLive`        | `UseAfterFree` |
//! | `read`      | `NullDereference` | value                | `UseAfterFree` |
//! | `release`   | `NullDereference` | → Freed, value moved | `DoubleFree`   |
//! | `reset`     | no-op             | → Freed, value dropped | `DoubleFree` |
//! | `borrow`    | `NullDereference` | view                 | `UseAfterFree` |
//!
//! Every transition into `Freed` advances the slot's generation, which
//! invalidates all outstanding [`BorrowView`]s.

use std::cell::{Ref, RefMut};
use std::fmt;
use std::rc::Rc;

use tenure_core::{Generation, SlotError, SlotId, SlotStatus};

use crate::cell::SlotCell;
use crate::ledger::{Ledger, LedgerEvent};
use crate::view::BorrowView;

/// Owner of at most one live value.
///
/// Created `Empty` (a null handle) or `Live`. Moves to `Freed` exactly
/// once, through [`release`](Self::release) or [`reset`](Self::reset).
/// `Freed` is terminal.
pub struct OwnedSlot<T> {
    cell: Rc<SlotCell<T>>,
    ledger: Option<Ledger>,
}

impl<T> OwnedSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            cell: Rc::new(SlotCell::new(None)),
            ledger: None,
        }
    }

    /// Create a slot that already owns `value`.
    pub fn live(value: T) -> Self {
        Self {
            cell: Rc::new(SlotCell::new(Some(value))),
            ledger: None,
        }
    }

    /// Create an empty slot registered in `ledger` under `label`.
    ///
    /// Tracked slots report every transition to the ledger, and report a
    /// leak if they are dropped while still live.
    pub fn tracked(ledger: &Ledger, label: impl Into<String>) -> Self {
        let cell = Rc::new(SlotCell::new(None));
        ledger.register(cell.id, label.into(), SlotStatus::Empty);
        Self {
            cell,
            ledger: Some(ledger.clone()),
        }
    }

    /// Create a slot that already owns `value`, registered in `ledger`
    /// under `label`. Counts as one allocation.
    pub fn tracked_live(ledger: &Ledger, label: impl Into<String>, value: T) -> Self {
        let cell = Rc::new(SlotCell::new(Some(value)));
        ledger.register(cell.id, label.into(), SlotStatus::Live);
        tracing::debug!(slot = %cell.id, "slot constructed");
        Self {
            cell,
            ledger: Some(ledger.clone()),
        }
    }

    /// Unique identifier of this slot.
    pub fn id(&self) -> SlotId {
        self.cell.id
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SlotStatus {
        self.cell.status.get()
    }

    /// Current generation. Advanced on the transition to `Freed`.
    pub fn generation(&self) -> Generation {
        self.cell.generation.get()
    }

    /// Whether the slot owns a value right now.
    pub fn is_live(&self) -> bool {
        self.status().is_live()
    }

    /// Whether this slot reports to a ledger.
    pub fn is_tracked(&self) -> bool {
        self.ledger.is_some()
    }

    /// Fail unless the slot could accept a [`construct`](Self::construct).
    ///
    /// Lets callers reject a store before building the value to store.
    pub fn check_vacant(&self) -> Result<(), SlotError> {
        match self.status() {
            SlotStatus::Empty => Ok(()),
            SlotStatus::Live => Err(SlotError::AlreadyLive { slot: self.id() }),
            SlotStatus::Freed => Err(self.cell.use_after_free(self.generation())),
        }
    }

    /// Fail unless the slot owns a value.
    pub fn check_live(&self) -> Result<(), SlotError> {
        self.cell.check_live()
    }

    /// Store `value`, moving the slot from `Empty` to `Live`.
    ///
    /// A live slot is never overwritten: the previous value would be
    /// orphaned. On error `value` is dropped.
    pub fn construct(&mut self, value: T) -> Result<(), SlotError> {
        self.check_vacant().inspect_err(warn_violation)?;
        let mut guard = self
            .cell
            .value
            .try_borrow_mut()
            .map_err(|_| SlotError::Borrowed { slot: self.cell.id })?;
        *guard = Some(value);
        drop(guard);
        self.cell.status.set(SlotStatus::Live);
        self.record(LedgerEvent::Constructed);
        tracing::debug!(slot = %self.id(), "slot constructed");
        Ok(())
    }

    /// Borrow the stored value.
    pub fn read(&self) -> Result<Ref<'_, T>, SlotError> {
        self.cell.check_live().inspect_err(warn_violation)?;
        let guard = self
            .cell
            .value
            .try_borrow()
            .map_err(|_| SlotError::Borrowed { slot: self.cell.id })?;
        Ref::filter_map(guard, Option::as_ref)
            .map_err(|_| SlotError::NullDereference { slot: self.cell.id })
    }

    /// Mutably borrow the stored value.
    ///
    /// Fails with [`SlotError::Borrowed`] while a view is inside
    /// [`BorrowView::with`].
    pub fn read_mut(&mut self) -> Result<RefMut<'_, T>, SlotError> {
        self.cell.check_live().inspect_err(warn_violation)?;
        let guard = self
            .cell
            .value
            .try_borrow_mut()
            .map_err(|_| SlotError::Borrowed { slot: self.cell.id })?;
        RefMut::filter_map(guard, Option::as_mut)
            .map_err(|_| SlotError::NullDereference { slot: self.cell.id })
    }

    /// Move the value out, transferring ownership to the caller.
    ///
    /// Succeeds at most once per slot.
    pub fn release(&mut self) -> Result<T, SlotError> {
        match self.status() {
            SlotStatus::Live => {}
            SlotStatus::Empty => {
                tracing::warn!(slot = %self.id(), "release of an empty slot");
                return Err(SlotError::NullDereference { slot: self.id() });
            }
            SlotStatus::Freed => {
                tracing::warn!(slot = %self.id(), "release of a freed slot");
                return Err(SlotError::DoubleFree { slot: self.id() });
            }
        }
        let value = self.take()?;
        self.record(LedgerEvent::Released {
            generation: self.generation(),
        });
        tracing::debug!(slot = %self.id(), generation = %self.generation(), "slot released");
        Ok(value)
    }

    /// Destroy the value in place.
    ///
    /// Resetting an empty slot is a no-op, like freeing a null pointer.
    /// Resetting a freed slot is a double free.
    pub fn reset(&mut self) -> Result<(), SlotError> {
        match self.status() {
            SlotStatus::Live => {}
            SlotStatus::Empty => return Ok(()),
            SlotStatus::Freed => {
                tracing::warn!(slot = %self.id(), "reset of a freed slot");
                return Err(SlotError::DoubleFree { slot: self.id() });
            }
        }
        let value = self.take()?;
        self.record(LedgerEvent::Reset {
            generation: self.generation(),
        });
        tracing::debug!(slot = %self.id(), generation = %self.generation(), "slot reset");
        drop(value);
        Ok(())
    }

    /// Create a non-owning view of the live value.
    pub fn borrow(&self) -> Result<BorrowView<T>, SlotError> {
        self.cell.check_live().inspect_err(warn_violation)?;
        Ok(BorrowView::new(
            Rc::downgrade(&self.cell),
            self.generation(),
            self.id(),
        ))
    }

    /// Take the value out and perform the `Live → Freed` transition.
    fn take(&mut self) -> Result<T, SlotError> {
        let value = self
            .cell
            .value
            .try_borrow_mut()
            .map_err(|_| SlotError::Borrowed { slot: self.cell.id })?
            .take()
            .ok_or(SlotError::NullDereference { slot: self.cell.id })?;
        self.cell.status.set(SlotStatus::Freed);
        self.cell.generation.set(self.generation().advance());
        Ok(value)
    }

    fn record(&self, event: LedgerEvent) {
        if let Some(ledger) = &self.ledger {
            ledger.record(self.cell.id, event);
        }
    }
}

fn warn_violation(err: &SlotError) {
    tracing::warn!(slot = %err.slot(), "{err}");
}

impl<T> Default for OwnedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for OwnedSlot<T> {
    fn drop(&mut self) {
        if self.is_live() && self.ledger.is_some() {
            tracing::warn!(slot = %self.id(), "tracked slot dropped while live");
            self.record(LedgerEvent::DroppedLive);
        }
    }
}

impl<T> fmt::Debug for OwnedSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedSlot")
            .field("id", &self.id())
            .field("status", &self.status())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_is_empty() {
        let slot: OwnedSlot<i32> = OwnedSlot::new();
        assert_eq!(slot.status(), SlotStatus::Empty);
        assert_eq!(slot.generation(), Generation::INITIAL);
        assert!(!slot.is_tracked());
    }

    #[test]
    fn construct_then_read() {
        let mut slot = OwnedSlot::new();
        slot.construct(42).unwrap();
        assert!(slot.is_live());
        assert_eq!(*slot.read().unwrap(), 42);
    }

    #[test]
    fn construct_on_live_slot_is_rejected() {
        let mut slot = OwnedSlot::live(vec![0u8; 100]);
        let err = slot.construct(vec![1u8; 100]).unwrap_err();
        assert_eq!(err, SlotError::AlreadyLive { slot: slot.id() });
        // The original value is untouched.
        assert_eq!(slot.read().unwrap()[0], 0);
    }

    #[test]
    fn construct_on_freed_slot_is_use_after_free() {
        let mut slot = OwnedSlot::live(1);
        slot.reset().unwrap();
        assert!(matches!(
            slot.construct(2),
            Err(SlotError::UseAfterFree { .. })
        ));
        assert_eq!(slot.status(), SlotStatus::Freed);
    }

    #[test]
    fn read_empty_is_null_dereference() {
        let slot: OwnedSlot<i32> = OwnedSlot::new();
        assert_eq!(
            slot.read().unwrap_err(),
            SlotError::NullDereference { slot: slot.id() }
        );
    }

    #[test]
    fn read_after_reset_is_use_after_free() {
        let mut slot = OwnedSlot::live(String::from("Hello"));
        slot.reset().unwrap();
        assert_eq!(
            slot.read().unwrap_err(),
            SlotError::UseAfterFree {
                slot: slot.id(),
                captured: Generation(1),
                current: Generation(1),
            }
        );
    }

    #[test]
    fn read_mut_updates_value() {
        let mut slot = OwnedSlot::live(1i64);
        *slot.read_mut().unwrap() += 1;
        assert_eq!(*slot.read().unwrap(), 2);
    }

    #[test]
    fn release_moves_value_out_once() {
        let mut slot = OwnedSlot::live(String::from("owned"));
        assert_eq!(slot.release().unwrap(), "owned");
        assert_eq!(slot.status(), SlotStatus::Freed);
        assert_eq!(slot.generation(), Generation(1));
        assert_eq!(
            slot.release().unwrap_err(),
            SlotError::DoubleFree { slot: slot.id() }
        );
    }

    #[test]
    fn release_empty_is_null_dereference() {
        let mut slot: OwnedSlot<u8> = OwnedSlot::new();
        assert!(matches!(
            slot.release(),
            Err(SlotError::NullDereference { .. })
        ));
        assert_eq!(slot.status(), SlotStatus::Empty);
    }

    #[test]
    fn reset_twice_is_double_free() {
        let mut slot = OwnedSlot::live(5);
        slot.reset().unwrap();
        assert_eq!(
            slot.reset().unwrap_err(),
            SlotError::DoubleFree { slot: slot.id() }
        );
        // Generation advanced once only.
        assert_eq!(slot.generation(), Generation(1));
    }

    #[test]
    fn reset_after_release_is_double_free() {
        let mut slot = OwnedSlot::live(5);
        let _ = slot.release().unwrap();
        assert!(matches!(slot.reset(), Err(SlotError::DoubleFree { .. })));
    }

    #[test]
    fn reset_empty_is_noop() {
        let mut slot: OwnedSlot<i32> = OwnedSlot::new();
        slot.reset().unwrap();
        slot.reset().unwrap();
        assert_eq!(slot.status(), SlotStatus::Empty);
        assert_eq!(slot.generation(), Generation::INITIAL);
    }

    #[test]
    fn borrow_requires_live_slot() {
        let slot: OwnedSlot<i32> = OwnedSlot::new();
        assert!(matches!(
            slot.borrow(),
            Err(SlotError::NullDereference { .. })
        ));
        let mut slot = OwnedSlot::live(1);
        slot.reset().unwrap();
        assert!(matches!(slot.borrow(), Err(SlotError::UseAfterFree { .. })));
    }

    #[test]
    fn tracked_slot_reports_to_ledger() {
        let ledger = Ledger::new();
        let mut slot = OwnedSlot::tracked(&ledger, "buffer");
        slot.construct([0u8; 16]).unwrap();
        slot.reset().unwrap();
        drop(slot);

        let entry = ledger.entry("buffer").unwrap();
        assert_eq!(entry.status, SlotStatus::Freed);
        assert_eq!(
            entry.history.as_slice(),
            &[
                LedgerEvent::Constructed,
                LedgerEvent::Reset {
                    generation: Generation(1)
                }
            ]
        );
        assert!(ledger.leaks().is_empty());
    }

    #[test]
    fn tracked_slot_dropped_live_is_leak() {
        let ledger = Ledger::new();
        {
            let mut slot = OwnedSlot::tracked(&ledger, "result");
            slot.construct(vec![0u8; 100]).unwrap();
        }
        assert_eq!(ledger.leaks(), vec!["result".to_string()]);
    }

    #[test]
    fn rejected_construct_is_not_counted() {
        let ledger = Ledger::new();
        let mut slot = OwnedSlot::tracked(&ledger, "buffer");
        slot.construct(1).unwrap();
        let _ = slot.construct(2);
        assert_eq!(ledger.allocations(), 1);
        slot.reset().unwrap();
    }

    #[test]
    fn check_vacant_follows_construct_rules() {
        let mut slot = OwnedSlot::new();
        slot.check_vacant().unwrap();
        assert!(matches!(slot.check_live(), Err(SlotError::NullDereference { .. })));

        slot.construct(1).unwrap();
        assert_eq!(
            slot.check_vacant().unwrap_err(),
            SlotError::AlreadyLive { slot: slot.id() }
        );
        slot.check_live().unwrap();

        slot.reset().unwrap();
        assert!(matches!(slot.check_vacant(), Err(SlotError::UseAfterFree { .. })));
        assert!(matches!(slot.check_live(), Err(SlotError::UseAfterFree { .. })));
    }

    #[test]
    fn tracked_live_counts_one_allocation() {
        let ledger = Ledger::new();
        let mut slot = OwnedSlot::tracked_live(&ledger, "name", String::from("alice"));
        assert!(slot.is_live());
        assert_eq!(ledger.allocations(), 1);
        assert_eq!(
            ledger.entry("name").unwrap().history.as_slice(),
            &[LedgerEvent::Constructed]
        );
        assert_eq!(slot.release().unwrap(), "alice");
        drop(slot);
        assert!(ledger.leaks().is_empty());
    }

    #[test]
    fn tracked_live_dropped_is_leak() {
        let ledger = Ledger::new();
        drop(OwnedSlot::tracked_live(&ledger, "name", 7u8));
        assert_eq!(ledger.leaks(), vec!["name".to_string()]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Copy, Debug)]
        enum Step {
            Construct,
            Release,
            Reset,
            Read,
        }

        fn step() -> impl Strategy<Value = Step> {
            prop_oneof![
                Just(Step::Construct),
                Just(Step::Release),
                Just(Step::Reset),
                Just(Step::Read),
            ]
        }

        proptest! {
            #[test]
            fn at_most_one_free_succeeds(steps in proptest::collection::vec(step(), 1..40)) {
                let mut slot = OwnedSlot::new();
                let mut frees = 0u32;
                for s in steps {
                    match s {
                        Step::Construct => { let _ = slot.construct(7u32); }
                        Step::Release => {
                            if slot.release().is_ok() { frees += 1; }
                        }
                        Step::Reset => {
                            let was_live = slot.is_live();
                            if slot.reset().is_ok() && was_live { frees += 1; }
                        }
                        Step::Read => { let _ = slot.read(); }
                    }
                }
                prop_assert!(frees <= 1);
                prop_assert_eq!(slot.generation().0, frees);
            }

            #[test]
            fn freed_is_terminal(steps in proptest::collection::vec(step(), 0..20)) {
                let mut slot = OwnedSlot::live(1u8);
                slot.reset().unwrap();
                for s in steps {
                    match s {
                        Step::Construct => prop_assert!(slot.construct(2).is_err()),
                        Step::Release => prop_assert!(slot.release().is_err()),
                        Step::Reset => prop_assert!(slot.reset().is_err()),
                        Step::Read => prop_assert!(slot.read().is_err()),
                    }
                    prop_assert_eq!(slot.status(), SlotStatus::Freed);
                }
            }
        }
    }
}
