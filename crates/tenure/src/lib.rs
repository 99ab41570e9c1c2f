//! Tenure: explicit, generation-checked ownership for heap values.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tenure sub-crates. For most users, adding `tenure` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tenure::prelude::*;
//!
//! let mut slot = OwnedSlot::new();
//! slot.construct(String::from("Hello")).unwrap();
//! let view = slot.borrow().unwrap();
//! assert_eq!(view.deref().unwrap(), "Hello");
//!
//! slot.reset().unwrap();
//! let err = view.deref().unwrap_err();
//! assert_eq!(DefectKind::from_error(&err), Some(DefectKind::UseAfterFree));
//! assert!(matches!(slot.reset(), Err(SlotError::DoubleFree { .. })));
//!
//! // The built-in benchmark cases all behave as expected.
//! let runner = ScenarioRunner::new(RunnerConfig::default()).unwrap();
//! let report = runner.run_all(&catalogue());
//! assert_eq!(report.exit_code(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tenure-core` | IDs, status, `SlotError`, `DefectKind` |
//! | [`slot`] | `tenure-slot` | `OwnedSlot`, `BorrowView`, `Ledger`, `SlotTable` |
//! | [`scenario`] | `tenure-scenario` | Scripts, the runner and the catalogue |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core identifiers, status and errors (`tenure-core`).
pub use tenure_core as types;

/// Owning slots, views, the allocation ledger and the handle table
/// (`tenure-slot`).
pub use tenure_slot as slot;

/// Scenario scripts, the runner and the built-in catalogue
/// (`tenure-scenario`).
pub use tenure_scenario as scenario;

/// Common imports for typical Tenure usage.
///
/// ```rust
/// use tenure::prelude::*;
/// ```
pub mod prelude {
    // Core
    pub use tenure_core::{DefectKind, Generation, SlotError, SlotId, SlotStatus};

    // Slots
    pub use tenure_slot::{BorrowView, Ledger, OwnedSlot, SlotHandle, SlotTable, TableError};

    // Scenarios
    pub use tenure_scenario::{
        catalogue, Expectation, Op, Outcome, Report, RunState, RunnerConfig, Scenario,
        ScenarioRunner, Value,
    };
}
