//! Contract-violation errors raised by ownership slots.
//!
//! Every error is local, synchronous and deterministic: it is returned
//! by the exact operation that broke the ownership contract, never
//! deferred to a later call.

use std::error::Error;
use std::fmt;

use crate::id::{Generation, SlotId};

/// Errors that can occur when operating on an ownership slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotError {
    /// A value was stored into a slot that already owns one. Overwriting
    /// would orphan the previous value.
    AlreadyLive {
        /// The slot that was already live.
        slot: SlotId,
    },
    /// A freed value was accessed, directly or through a stale view.
    UseAfterFree {
        /// The slot whose value was accessed.
        slot: SlotId,
        /// Generation captured by the accessor (the view, or the slot's
        /// own generation at the time of the access).
        captured: Generation,
        /// Current generation of the slot. Equal to `captured` only when
        /// the slot itself has been dropped or freed in place.
        current: Generation,
    },
    /// A slot was released or reset after it had already been freed.
    DoubleFree {
        /// The slot that was freed twice.
        slot: SlotId,
    },
    /// A slot that never received a value was dereferenced.
    NullDereference {
        /// The empty slot.
        slot: SlotId,
    },
    /// Ownership was changed while the value was lent out through a view.
    Borrowed {
        /// The slot that was still borrowed.
        slot: SlotId,
    },
}

impl SlotError {
    /// The slot involved in the violation.
    pub fn slot(&self) -> SlotId {
        match self {
            Self::AlreadyLive { slot }
            | Self::UseAfterFree { slot, .. }
            | Self::DoubleFree { slot }
            | Self::NullDereference { slot }
            | Self::Borrowed { slot } => *slot,
        }
    }
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyLive { slot } => {
                write!(f, "slot {slot} is already live; storing would leak the previous value")
            }
            Self::UseAfterFree {
                slot,
                captured,
                current,
            } => {
                write!(
                    f,
                    "use after free: slot {slot} accessed at generation {captured}, current generation {current}"
                )
            }
            Self::DoubleFree { slot } => write!(f, "double free: slot {slot} was already freed"),
            Self::NullDereference { slot } => {
                write!(f, "null dereference: slot {slot} holds no value")
            }
            Self::Borrowed { slot } => {
                write!(f, "slot {slot} is borrowed; ownership cannot change")
            }
        }
    }
}

impl Error for SlotError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_accessor_covers_every_variant() {
        let id = SlotId::next();
        let errors = [
            SlotError::AlreadyLive { slot: id },
            SlotError::UseAfterFree {
                slot: id,
                captured: Generation(0),
                current: Generation(1),
            },
            SlotError::DoubleFree { slot: id },
            SlotError::NullDereference { slot: id },
            SlotError::Borrowed { slot: id },
        ];
        for e in &errors {
            assert_eq!(e.slot(), id);
        }
    }

    #[test]
    fn display_mentions_generations() {
        let id = SlotId::next();
        let e = SlotError::UseAfterFree {
            slot: id,
            captured: Generation(2),
            current: Generation(3),
        };
        let msg = e.to_string();
        assert!(msg.contains("generation 2"));
        assert!(msg.contains("current generation 3"));
    }
}
