//! Core types for the Tenure ownership-tracking workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the slot layer and the scenario runner:
//! slot identifiers, generation stamps, the slot lifecycle status,
//! contract-violation errors and the defect categories they map to.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod defect;
pub mod error;
pub mod id;
pub mod status;

pub use defect::{DefectKind, UnknownDefect};
pub use error::SlotError;
pub use id::{Generation, SlotId};
pub use status::SlotStatus;
