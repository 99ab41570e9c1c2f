//! Scenario scripts: operations, conditions and expectations.

use std::fmt;

use tenure_core::DefectKind;

use crate::payload::Value;

/// A pointer field inside a struct-like payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// `User::name`.
    Name,
    /// `Container::data`.
    Data,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// A branch condition evaluated against the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Always taken.
    Always,
    /// Never taken.
    Never,
    /// A fixed input, e.g. a command-line flag or a null argument.
    Flag(bool),
    /// The slot has never received a value (a null pointer check).
    IsNull(String),
    /// The slot currently owns a value. Does not read the value.
    IsLive(String),
    /// The slot's buffer or string is empty. Reads the value.
    PayloadEmpty(String),
    /// The slot's buffer or string is longer than the limit. Reads the value.
    LenExceeds(String, usize),
    /// The slot's scalar is even. Reads the value.
    IntIsEven(String),
}

/// One step of a scenario script.
///
/// Slot and view names are local to a run. Ops that name a slot that was
/// never declared fail with a [`ScriptError`](crate::ScriptError), except
/// [`Op::Construct`] and [`Op::Release`]'s target, which declare on first
/// use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// Declare an empty (null) tracked slot.
    Declare {
        /// Slot name.
        slot: String,
    },
    /// Allocate `value` into the slot.
    Construct {
        /// Slot name.
        slot: String,
        /// Template of the value to allocate.
        value: Value,
    },
    /// Read the slot's value.
    Read {
        /// Slot name.
        slot: String,
    },
    /// Overwrite the slot's value in place.
    Write {
        /// Slot name.
        slot: String,
        /// New value.
        value: Value,
    },
    /// Increment a scalar or a user's id in place.
    Increment {
        /// Slot name.
        slot: String,
    },
    /// Take a non-owning view of the slot.
    Borrow {
        /// Slot name.
        slot: String,
        /// Name of the new view.
        view: String,
    },
    /// Take a non-owning view of a pointer field of the slot's value.
    BorrowField {
        /// Slot name.
        slot: String,
        /// Field to view.
        field: Field,
        /// Name of the new view.
        view: String,
    },
    /// Read through a view.
    Deref {
        /// View name.
        view: String,
    },
    /// Call the function pointer of a handler through a view.
    Invoke {
        /// View name.
        view: String,
    },
    /// Read a pointer field of the slot's value.
    ReadField {
        /// Slot name.
        slot: String,
        /// Field to read.
        field: Field,
    },
    /// Store through a pointer field of the slot's value.
    WriteField {
        /// Slot name.
        slot: String,
        /// Field to write.
        field: Field,
        /// New value.
        value: Value,
    },
    /// Free a pointer field of the slot's value.
    ResetField {
        /// Slot name.
        slot: String,
        /// Field to free.
        field: Field,
    },
    /// Move the value out of the slot. With `into`, ownership passes to
    /// that slot, and an empty source leaves the target empty; without,
    /// the new owner destroys it immediately.
    Release {
        /// Source slot.
        slot: String,
        /// Destination slot, if any.
        into: Option<String>,
    },
    /// Free the slot's value.
    Reset {
        /// Slot name.
        slot: String,
    },
    /// Run `then` when `cond` holds.
    When {
        /// Branch condition.
        cond: Condition,
        /// Ops to run when the condition holds.
        then: Vec<Op>,
    },
    /// Leave the scenario body early.
    Return,
}

impl Op {
    /// [`Op::Declare`].
    pub fn declare(slot: impl Into<String>) -> Self {
        Self::Declare { slot: slot.into() }
    }

    /// [`Op::Construct`].
    pub fn construct(slot: impl Into<String>, value: Value) -> Self {
        Self::Construct {
            slot: slot.into(),
            value,
        }
    }

    /// [`Op::Read`].
    pub fn read(slot: impl Into<String>) -> Self {
        Self::Read { slot: slot.into() }
    }

    /// [`Op::Write`].
    pub fn write(slot: impl Into<String>, value: Value) -> Self {
        Self::Write {
            slot: slot.into(),
            value,
        }
    }

    /// [`Op::Increment`].
    pub fn increment(slot: impl Into<String>) -> Self {
        Self::Increment { slot: slot.into() }
    }

    /// [`Op::Borrow`].
    pub fn borrow(slot: impl Into<String>, view: impl Into<String>) -> Self {
        Self::Borrow {
            slot: slot.into(),
            view: view.into(),
        }
    }

    /// [`Op::BorrowField`].
    pub fn borrow_field(slot: impl Into<String>, field: Field, view: impl Into<String>) -> Self {
        Self::BorrowField {
            slot: slot.into(),
            field,
            view: view.into(),
        }
    }

    /// [`Op::Deref`].
    pub fn deref(view: impl Into<String>) -> Self {
        Self::Deref { view: view.into() }
    }

    /// [`Op::Invoke`].
    pub fn invoke(view: impl Into<String>) -> Self {
        Self::Invoke { view: view.into() }
    }

    /// [`Op::ReadField`].
    pub fn read_field(slot: impl Into<String>, field: Field) -> Self {
        Self::ReadField {
            slot: slot.into(),
            field,
        }
    }

    /// [`Op::WriteField`].
    pub fn write_field(slot: impl Into<String>, field: Field, value: Value) -> Self {
        Self::WriteField {
            slot: slot.into(),
            field,
            value,
        }
    }

    /// [`Op::ResetField`].
    pub fn reset_field(slot: impl Into<String>, field: Field) -> Self {
        Self::ResetField {
            slot: slot.into(),
            field,
        }
    }

    /// [`Op::Release`] into another slot.
    pub fn transfer(slot: impl Into<String>, into: impl Into<String>) -> Self {
        Self::Release {
            slot: slot.into(),
            into: Some(into.into()),
        }
    }

    /// [`Op::Release`] to a new owner that destroys the value.
    pub fn release(slot: impl Into<String>) -> Self {
        Self::Release {
            slot: slot.into(),
            into: None,
        }
    }

    /// [`Op::Reset`].
    pub fn reset(slot: impl Into<String>) -> Self {
        Self::Reset { slot: slot.into() }
    }

    /// [`Op::When`].
    pub fn when(cond: Condition, then: impl IntoIterator<Item = Op>) -> Self {
        Self::When {
            cond,
            then: then.into_iter().collect(),
        }
    }
}

/// What a scenario is expected to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// The script runs to completion with no violation and no leak.
    Success,
    /// The script is stopped by (or ends with) the given defect.
    Detected(DefectKind),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Detected(kind) => write!(f, "{kind}"),
        }
    }
}

/// A named operation sequence with its expected outcome.
///
/// Immutable once built; a runner may execute it any number of times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    description: String,
    expected: Expectation,
    steps: Vec<Op>,
}

impl Scenario {
    /// Start building a scenario called `name`.
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            name: name.into(),
            description: String::new(),
            expected: Expectation::Success,
            steps: Vec::new(),
        }
    }

    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description of the case.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Expected outcome.
    pub fn expected(&self) -> Expectation {
        self.expected
    }

    /// Operations, in execution order.
    pub fn steps(&self) -> &[Op] {
        &self.steps
    }
}

/// Builder for [`Scenario`].
#[derive(Clone, Debug)]
#[must_use]
pub struct ScenarioBuilder {
    name: String,
    description: String,
    expected: Expectation,
    steps: Vec<Op>,
}

impl ScenarioBuilder {
    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the expected outcome. Defaults to [`Expectation::Success`].
    pub fn expect(mut self, expected: Expectation) -> Self {
        self.expected = expected;
        self
    }

    /// Expect the given defect to be detected.
    pub fn detects(self, kind: DefectKind) -> Self {
        self.expect(Expectation::Detected(kind))
    }

    /// Append one op.
    pub fn step(mut self, op: Op) -> Self {
        self.steps.push(op);
        self
    }

    /// Append several ops.
    pub fn steps(mut self, ops: impl IntoIterator<Item = Op>) -> Self {
        self.steps.extend(ops);
        self
    }

    /// Finish the scenario.
    pub fn build(self) -> Scenario {
        Scenario {
            name: self.name,
            description: self.description,
            expected: self.expected,
            steps: self.steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_success() {
        let s = Scenario::builder("empty").build();
        assert_eq!(s.name(), "empty");
        assert_eq!(s.expected(), Expectation::Success);
        assert!(s.steps().is_empty());
    }

    #[test]
    fn builder_collects_steps_in_order() {
        let s = Scenario::builder("df")
            .description("free twice")
            .detects(DefectKind::DoubleFree)
            .step(Op::construct("res", Value::Int(4)))
            .steps([Op::reset("res"), Op::reset("res")])
            .build();
        assert_eq!(s.description(), "free twice");
        assert_eq!(s.expected(), Expectation::Detected(DefectKind::DoubleFree));
        assert_eq!(s.steps().len(), 3);
        assert_eq!(s.steps()[2], Op::reset("res"));
    }

    #[test]
    fn expectation_display() {
        assert_eq!(Expectation::Success.to_string(), "success");
        assert_eq!(
            Expectation::Detected(DefectKind::UseAfterFree).to_string(),
            "use-after-free"
        );
    }

    #[test]
    fn transfer_and_release_helpers() {
        assert_eq!(
            Op::transfer("buffer", "result"),
            Op::Release {
                slot: "buffer".into(),
                into: Some("result".into())
            }
        );
        assert_eq!(
            Op::release("buffer"),
            Op::Release {
                slot: "buffer".into(),
                into: None
            }
        );
    }
}
