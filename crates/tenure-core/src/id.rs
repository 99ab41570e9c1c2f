//! Strongly-typed identifiers and generation stamps.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`SlotId`] allocation.
static SLOT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an ownership slot.
///
/// Allocated from a monotonic atomic counter via [`SlotId::next`].
/// Two distinct slots always have different IDs, even if one was dropped
/// and the other was created at the same address. Ledgers and error
/// messages use it to name the slot involved in a violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    /// Allocate a fresh, unique slot ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(SLOT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generation stamp of a slot.
///
/// Advanced every time a slot's value is freed. A borrow captures the
/// generation at creation time and is valid only while the slot still
/// carries the same stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u32);

impl Generation {
    /// The generation of a slot that has never been freed.
    pub const INITIAL: Generation = Generation(0);

    /// The next generation. Wraps at `u32::MAX`.
    #[must_use]
    pub fn advance(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Generation {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
