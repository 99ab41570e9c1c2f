//! Slab of owned values addressed by generational handles.
//!
//! [`SlotTable`] is the many-values counterpart of
//! [`OwnedSlot`](crate::OwnedSlot): storage indices are recycled through a
//! free list, and each removal advances the index's generation so that a
//! handle to the old value cannot reach the new one. Stale handles are
//! reported as contract violations rather than resolving to whatever now
//! lives at the index.

use std::error::Error;
use std::fmt;

use tenure_core::{Generation, SlotError, SlotId};

/// Handle to a value stored in a [`SlotTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct SlotHandle {
    index: u32,
    generation: Generation,
}

impl SlotHandle {
    /// Storage index inside the table.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the handle was issued at.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotHandle(idx={}, gen={})", self.index, self.generation)
    }
}

/// Errors from [`SlotTable`] operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableError {
    /// The handle broke the ownership contract of its entry.
    Slot(SlotError),
    /// The handle's index was never issued by this table.
    UnknownHandle {
        /// The offending index.
        index: u32,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(e) => write!(f, "{e}"),
            Self::UnknownHandle { index } => write!(f, "unknown handle index {index}"),
        }
    }
}

impl Error for TableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Slot(e) => Some(e),
            Self::UnknownHandle { .. } => None,
        }
    }
}

impl From<SlotError> for TableError {
    fn from(e: SlotError) -> Self {
        Self::Slot(e)
    }
}

struct Entry<T> {
    id: SlotId,
    generation: Generation,
    data: Option<T>,
}

/// A slab of owned values with free-list reuse and generation checks.
pub struct SlotTable<T> {
    entries: Vec<Entry<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> SlotTable<T> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Store `value` and return its handle.
    pub fn insert(&mut self, value: T) -> SlotHandle {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index as usize];
            entry.data = Some(value);
            return SlotHandle {
                index,
                generation: entry.generation,
            };
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            id: SlotId::next(),
            generation: Generation::INITIAL,
            data: Some(value),
        });
        SlotHandle {
            index,
            generation: Generation::INITIAL,
        }
    }

    /// Borrow the value behind `handle`.
    ///
    /// A handle from an older generation is a use after free.
    pub fn get(&self, handle: SlotHandle) -> Result<&T, TableError> {
        let entry = self.entry(handle)?;
        match (&entry.data, entry.generation == handle.generation) {
            (Some(value), true) => Ok(value),
            _ => Err(use_after_free(entry, handle).into()),
        }
    }

    /// Mutably borrow the value behind `handle`.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Result<&mut T, TableError> {
        let index = self.index_of(handle)?;
        let entry = &mut self.entries[index];
        if entry.generation != handle.generation || entry.data.is_none() {
            return Err(use_after_free(entry, handle).into());
        }
        entry
            .data
            .as_mut()
            .ok_or(TableError::UnknownHandle {
                index: handle.index,
            })
    }

    /// Remove the value behind `handle`, returning it.
    ///
    /// Advances the entry's generation. Removing through a handle that was
    /// already removed, or whose index has since been reused, is a double
    /// free. An entry whose generation wraps back to 0 is retired rather
    /// than recycled, so stale handles from the first epoch can never
    /// match again.
    pub fn remove(&mut self, handle: SlotHandle) -> Result<T, TableError> {
        let index = self.index_of(handle)?;
        let entry = &mut self.entries[index];
        if entry.generation != handle.generation || entry.data.is_none() {
            tracing::warn!(handle = %handle, "double remove");
            return Err(SlotError::DoubleFree { slot: entry.id }.into());
        }
        let value = entry.data.take().ok_or(TableError::UnknownHandle {
            index: handle.index,
        })?;
        entry.generation = entry.generation.advance();
        if entry.generation != Generation::INITIAL {
            self.free_list.push(handle.index);
        }
        self.live -= 1;
        Ok(value)
    }

    /// Whether `handle` currently resolves to a value.
    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the table holds no live values.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn index_of(&self, handle: SlotHandle) -> Result<usize, TableError> {
        let index = handle.index as usize;
        if index < self.entries.len() {
            Ok(index)
        } else {
            Err(TableError::UnknownHandle {
                index: handle.index,
            })
        }
    }

    fn entry(&self, handle: SlotHandle) -> Result<&Entry<T>, TableError> {
        let index = self.index_of(handle)?;
        Ok(&self.entries[index])
    }
}

fn use_after_free<T>(entry: &Entry<T>, handle: SlotHandle) -> SlotError {
    SlotError::UseAfterFree {
        slot: entry.id,
        captured: handle.generation,
        current: entry.generation,
    }
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
