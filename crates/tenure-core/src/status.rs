//! Lifecycle status of an ownership slot.

use std::fmt;

/// Tri-state lifecycle of a slot.
///
/// ```text
/// Empty ──construct──▶ Live ──release / reset──▶ Freed
/// ```
///
/// `Freed` is terminal: no transition leaves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SlotStatus {
    /// No value has been stored yet (a null handle).
    #[default]
    Empty,
    /// The slot owns a value that may be read.
    Live,
    /// The value was released or destroyed; every access is a violation.
    Freed,
}

impl SlotStatus {
    /// Whether the slot currently owns a value.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Whether the slot has reached the terminal `Freed` state.
    pub fn is_freed(self) -> bool {
        matches!(self, Self::Freed)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Live => write!(f, "live"),
            Self::Freed => write!(f, "freed"),
        }
    }
}
