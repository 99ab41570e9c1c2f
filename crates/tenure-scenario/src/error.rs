//! Errors raised while executing a scenario script.
//!
//! Two families: [`SlotError`]s are the contract violations a scenario
//! exists to provoke; [`ScriptError`]s mean the script itself is broken
//! (unknown names, field access on the wrong payload). The runner turns
//! the former into detected defects and always fails on the latter.

use std::error::Error;
use std::fmt;

use tenure_core::SlotError;

use crate::script::Field;

/// A malformed script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// An op named a slot that was never declared.
    UnknownSlot {
        /// The missing slot name.
        slot: String,
    },
    /// An op named a view that was never taken.
    UnknownView {
        /// The missing view name.
        view: String,
    },
    /// An op needs a different payload variant.
    WrongPayload {
        /// Slot or view name.
        target: String,
        /// Variant the op needs.
        expected: &'static str,
        /// Variant actually found.
        found: &'static str,
    },
    /// A field op named a field the payload does not have.
    NoSuchField {
        /// Slot name.
        slot: String,
        /// The requested field.
        field: Field,
        /// Variant actually found.
        found: &'static str,
    },
    /// The scenario has no steps.
    EmptyScenario,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSlot { slot } => write!(f, "unknown slot '{slot}'"),
            Self::UnknownView { view } => write!(f, "unknown view '{view}'"),
            Self::WrongPayload {
                target,
                expected,
                found,
            } => write!(f, "'{target}' holds a {found}, expected a {expected}"),
            Self::NoSuchField { slot, field, found } => {
                write!(f, "'{slot}' holds a {found}, which has no field '{field}'")
            }
            Self::EmptyScenario => write!(f, "scenario has no steps"),
        }
    }
}

impl Error for ScriptError {}

/// Failure of a single op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// An ownership contract was violated.
    Slot(SlotError),
    /// The script is malformed.
    Script(ScriptError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(e) => write!(f, "{e}"),
            Self::Script(e) => write!(f, "script: {e}"),
        }
    }
}

impl Error for ExecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Slot(e) => Some(e),
            Self::Script(e) => Some(e),
        }
    }
}

impl From<SlotError> for ExecError {
    fn from(e: SlotError) -> Self {
        Self::Slot(e)
    }
}

impl From<ScriptError> for ExecError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}
