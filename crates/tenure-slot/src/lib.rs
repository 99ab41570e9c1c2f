//! Generation-checked ownership slots for Tenure.
//!
//! An [`OwnedSlot`] owns at most one value and walks a strict
//! `Empty → Live → Freed` lifecycle. A [`BorrowView`] observes a live slot
//! without owning it and fails closed once the slot's generation moves on.
//! Both report violations as [`SlotError`](tenure_core::SlotError) values
//! instead of reading stale memory.
//!
//! # Architecture
//!
//! ```text
//! OwnedSlot<T> ──Rc──▶ SlotCell<T> ◀──Weak── BorrowView<T>
//!      │                 ├── status: Empty | Live | Freed
//!      │                 ├── generation (advanced on free)
//!      │                 └── value: Option<T>
//!      └── Option<Ledger> (allocation accounting, leak reports)
//! ```
//!
//! [`SlotTable`] is the slab-shaped sibling: many values addressed by
//! `(index, generation)` handles with free-list reuse.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); slots are neither
//! `Send` nor `Sync`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod cell;
pub mod ledger;
pub mod slot;
pub mod table;
pub mod view;

pub use ledger::{Ledger, LedgerEntry, LedgerEvent, LedgerSummary};
pub use slot::OwnedSlot;
pub use table::{SlotHandle, SlotTable, TableError};
pub use view::BorrowView;
