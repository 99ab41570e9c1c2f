//! Non-owning, generation-checked views.
//!
//! A [`BorrowView`] is the safe replacement for a raw non-owning pointer.
//! It remembers the generation its slot had when the view was taken; once
//! the slot is released, reset or dropped, every access through the view
//! fails with [`SlotError::UseAfterFree`] instead of returning stale data.

use std::fmt;
use std::rc::Weak;

use tenure_core::{Generation, SlotError, SlotId};

use crate::cell::SlotCell;

/// Observer of a live [`OwnedSlot`](crate::OwnedSlot).
///
/// Views never own the value and cannot change the slot's status.
pub struct BorrowView<T> {
    cell: Weak<SlotCell<T>>,
    captured: Generation,
    slot: SlotId,
}

impl<T> BorrowView<T> {
    pub(crate) fn new(cell: Weak<SlotCell<T>>, captured: Generation, slot: SlotId) -> Self {
        Self {
            cell,
            captured,
            slot,
        }
    }

    /// The slot this view was taken from.
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Generation captured when the view was created.
    pub fn captured_generation(&self) -> Generation {
        self.captured
    }

    /// Whether a dereference would currently succeed.
    pub fn is_valid(&self) -> bool {
        self.cell.upgrade().is_some_and(|cell| {
            cell.status.get().is_live() && cell.generation.get() == self.captured
        })
    }

    /// Run `f` against the observed value.
    ///
    /// The value stays borrowed for the duration of `f`; the owning slot
    /// rejects ownership changes with [`SlotError::Borrowed`] meanwhile.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, SlotError> {
        let Some(cell) = self.cell.upgrade() else {
            // The owner itself is gone (its enclosing value was freed).
            let err = SlotError::UseAfterFree {
                slot: self.slot,
                captured: self.captured,
                current: self.captured.advance(),
            };
            tracing::warn!(slot = %self.slot, "view outlived its slot");
            return Err(err);
        };
        if !cell.status.get().is_live() || cell.generation.get() != self.captured {
            tracing::warn!(
                slot = %self.slot,
                captured = %self.captured,
                current = %cell.generation.get(),
                "stale view dereferenced"
            );
            return Err(cell.use_after_free(self.captured));
        }
        let guard = cell
            .value
            .try_borrow()
            .map_err(|_| SlotError::Borrowed { slot: self.slot })?;
        let value = guard
            .as_ref()
            .ok_or_else(|| cell.use_after_free(self.captured))?;
        let out = f(value);
        Ok(out)
    }

    /// Clone the observed value out.
    #[allow(clippy::should_implement_trait)]
    pub fn deref(&self) -> Result<T, SlotError>
    where
        T: Clone,
    {
        self.with(T::clone)
    }
}

impl<T> Clone for BorrowView<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Weak::clone(&self.cell),
            captured: self.captured,
            slot: self.slot,
        }
    }
}

impl<T> fmt::Debug for BorrowView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BorrowView")
            .field("slot", &self.slot)
            .field("captured", &self.captured)
            .field("valid", &self.is_valid())
            .finish()
    }
}
