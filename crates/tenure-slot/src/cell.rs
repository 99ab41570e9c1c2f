//! Shared state behind a slot and its views.

use std::cell::{Cell, RefCell};

use tenure_core::{Generation, SlotError, SlotId, SlotStatus};

/// The state an [`OwnedSlot`](crate::OwnedSlot) owns and its
/// [`BorrowView`](crate::BorrowView)s observe.
///
/// Only the owning slot holds a strong reference, so the cell (and any
/// value still inside it) dies with the slot.
pub(crate) struct SlotCell<T> {
    pub(crate) id: SlotId,
    pub(crate) status: Cell<SlotStatus>,
    pub(crate) generation: Cell<Generation>,
    pub(crate) value: RefCell<Option<T>>,
}

impl<T> SlotCell<T> {
    pub(crate) fn new(value: Option<T>) -> Self {
        let status = if value.is_some() {
            SlotStatus::Live
        } else {
            SlotStatus::Empty
        };
        Self {
            id: SlotId::next(),
            status: Cell::new(status),
            generation: Cell::new(Generation::INITIAL),
            value: RefCell::new(value),
        }
    }

    /// Fail unless the cell currently owns a value.
    pub(crate) fn check_live(&self) -> Result<(), SlotError> {
        match self.status.get() {
            SlotStatus::Live => Ok(()),
            SlotStatus::Empty => Err(SlotError::NullDereference { slot: self.id }),
            SlotStatus::Freed => Err(self.use_after_free(self.generation.get())),
        }
    }

    pub(crate) fn use_after_free(&self, captured: Generation) -> SlotError {
        SlotError::UseAfterFree {
            slot: self.id,
            captured,
            current: self.generation.get(),
        }
    }
}
