//! Per-run execution state.
//!
//! A [`Frame`] owns every slot and view of one scenario run. Slots live in
//! a [`SlotTable`] and script names resolve to their handles. Slots are
//! tracked in the frame's [`Ledger`], so dropping the frame reports
//! whatever the script left live.

use indexmap::IndexMap;
use tenure_core::SlotStatus;
use tenure_slot::{BorrowView, Ledger, OwnedSlot, SlotHandle, SlotTable};

use crate::error::{ExecError, ScriptError};
use crate::payload::{Payload, Value};
use crate::script::{Condition, Field, Op};

/// Control flow after executing a block of ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Execution reached the end of the block.
    Continue,
    /// An [`Op::Return`] was executed.
    Return,
}

/// Named slots and views of a single scenario run.
pub struct Frame {
    ledger: Ledger,
    slots: SlotTable<OwnedSlot<Payload>>,
    names: IndexMap<String, SlotHandle>,
    views: IndexMap<String, BorrowView<Payload>>,
    executed: usize,
}

impl Frame {
    /// Create an empty frame reporting to `ledger`.
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            slots: SlotTable::new(),
            names: IndexMap::new(),
            views: IndexMap::new(),
            executed: 0,
        }
    }

    /// The frame's ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Number of ops executed so far, including nested ones.
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&OwnedSlot<Payload>> {
        self.slot_ref(name).ok()
    }

    /// Execute `ops` in order, stopping at the first error or return.
    pub fn run(&mut self, ops: &[Op]) -> Result<Flow, ExecError> {
        for op in ops {
            self.executed += 1;
            if self.step(op)? == Flow::Return {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Continue)
    }

    fn step(&mut self, op: &Op) -> Result<Flow, ExecError> {
        tracing::trace!(?op, "exec");
        match op {
            Op::Declare { slot } => {
                self.declare(slot)?;
            }
            Op::Construct { slot, value } => {
                self.declare(slot)?.check_vacant()?;
                let payload = value.materialize(&self.ledger, slot);
                self.declare(slot)?.construct(payload)?;
            }
            Op::Read { slot } => {
                let seen = self.slot_ref(slot)?.read()?.observe()?;
                tracing::debug!(slot = %slot, "read {seen}");
            }
            Op::Write { slot, value } => {
                self.slot_ref(slot)?.check_live()?;
                let payload = value.materialize(&self.ledger, slot);
                let mut guard = self.slot_mut(slot)?.read_mut()?;
                *guard = payload;
            }
            Op::Increment { slot } => {
                let mut guard = self.slot_mut(slot)?.read_mut()?;
                match &mut *guard {
                    Payload::Int(v) => *v += 1,
                    Payload::User(u) => u.id += 1,
                    other => {
                        return Err(ScriptError::WrongPayload {
                            target: slot.clone(),
                            expected: "int or user",
                            found: other.kind(),
                        }
                        .into())
                    }
                }
            }
            Op::Borrow { slot, view } => {
                let v = self.slot_ref(slot)?.borrow()?;
                self.views.insert(view.clone(), v);
            }
            Op::BorrowField { slot, field, view } => {
                let guard = self.slot_ref(slot)?.read()?;
                let v = field_of(slot, &guard, *field)?.borrow()?;
                drop(guard);
                self.views.insert(view.clone(), v);
            }
            Op::Deref { view } => {
                let seen = self.view(view)?.with(Payload::observe)??;
                tracing::debug!(view = %view, "deref {seen}");
            }
            Op::Invoke { view } => {
                let called = self.view(view)?.with(|p| match p {
                    Payload::Handler(h) => Ok(h.invoke()),
                    other => Err(ScriptError::WrongPayload {
                        target: view.clone(),
                        expected: "handler",
                        found: other.kind(),
                    }),
                })??;
                tracing::debug!(view = %view, "invoke: {called}");
            }
            Op::ReadField { slot, field } => {
                let guard = self.slot_ref(slot)?.read()?;
                let inner = field_of(slot, &guard, *field)?;
                let seen = inner.read()?.observe()?;
                tracing::debug!(slot = %slot, field = %field, "read {seen}");
            }
            Op::WriteField { slot, field, value } => {
                {
                    let guard = self.slot_ref(slot)?.read()?;
                    field_of(slot, &guard, *field)?.check_live()?;
                }
                let payload = value.materialize(&self.ledger, &format!("{slot}.{field}"));
                let mut guard = self.slot_mut(slot)?.read_mut()?;
                let inner = field_of_mut(slot, &mut guard, *field)?;
                *inner.read_mut()? = payload;
            }
            Op::ResetField { slot, field } => {
                let mut guard = self.slot_mut(slot)?.read_mut()?;
                field_of_mut(slot, &mut guard, *field)?.reset()?;
            }
            Op::Release { slot, into: None } => {
                drop(self.slot_mut(slot)?.release()?);
            }
            Op::Release {
                slot,
                into: Some(target),
            } => {
                self.slot_ref(slot)?;
                self.declare(target)?.check_vacant()?;
                // Handing over a null owner hands over null.
                if self.slot_ref(slot)?.status() == SlotStatus::Empty {
                    tracing::debug!(slot = %slot, into = %target, "null handed over");
                    return Ok(Flow::Continue);
                }
                let value = self.slot_mut(slot)?.release()?;
                self.declare(target)?.construct(value)?;
            }
            Op::Reset { slot } => {
                self.slot_mut(slot)?.reset()?;
            }
            Op::When { cond, then } => {
                if self.eval(cond)? {
                    return self.run(then);
                }
            }
            Op::Return => return Ok(Flow::Return),
        }
        Ok(Flow::Continue)
    }

    fn eval(&self, cond: &Condition) -> Result<bool, ExecError> {
        Ok(match cond {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Flag(b) => *b,
            Condition::IsNull(slot) => self.slot_ref(slot)?.status() == SlotStatus::Empty,
            Condition::IsLive(slot) => self.slot_ref(slot)?.is_live(),
            Condition::PayloadEmpty(slot) => self.slot_ref(slot)?.read()?.is_empty(),
            Condition::LenExceeds(slot, limit) => self.slot_ref(slot)?.read()?.len() > *limit,
            Condition::IntIsEven(slot) => match &*self.slot_ref(slot)?.read()? {
                Payload::Int(v) => v % 2 == 0,
                other => {
                    return Err(ScriptError::WrongPayload {
                        target: slot.clone(),
                        expected: "int",
                        found: other.kind(),
                    }
                    .into())
                }
            },
        })
    }

    /// Get or create the tracked slot called `name`.
    fn declare(&mut self, name: &str) -> Result<&mut OwnedSlot<Payload>, ScriptError> {
        if !self.names.contains_key(name) {
            let handle = self.slots.insert(OwnedSlot::tracked(&self.ledger, name));
            self.names.insert(name.to_string(), handle);
        }
        self.slot_mut(name)
    }

    fn handle(&self, name: &str) -> Result<SlotHandle, ScriptError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ScriptError::UnknownSlot {
                slot: name.to_string(),
            })
    }

    // Frame handles are never removed, so a failed lookup means the name
    // was never declared.
    fn slot_ref(&self, name: &str) -> Result<&OwnedSlot<Payload>, ScriptError> {
        let handle = self.handle(name)?;
        self.slots
            .get(handle)
            .map_err(|_| ScriptError::UnknownSlot {
                slot: name.to_string(),
            })
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut OwnedSlot<Payload>, ScriptError> {
        let handle = self.handle(name)?;
        self.slots
            .get_mut(handle)
            .map_err(|_| ScriptError::UnknownSlot {
                slot: name.to_string(),
            })
    }

    fn view(&self, name: &str) -> Result<&BorrowView<Payload>, ScriptError> {
        self.views.get(name).ok_or_else(|| ScriptError::UnknownView {
            view: name.to_string(),
        })
    }
}

fn field_of<'a>(
    slot: &str,
    payload: &'a Payload,
    field: Field,
) -> Result<&'a OwnedSlot<Payload>, ScriptError> {
    match (payload, field) {
        (Payload::User(u), Field::Name) => Ok(&u.name),
        (Payload::Container(c), Field::Data) => Ok(&c.data),
        (other, field) => Err(ScriptError::NoSuchField {
            slot: slot.to_string(),
            field,
            found: other.kind(),
        }),
    }
}

fn field_of_mut<'a>(
    slot: &str,
    payload: &'a mut Payload,
    field: Field,
) -> Result<&'a mut OwnedSlot<Payload>, ScriptError> {
    match (payload, field) {
        (Payload::User(u), Field::Name) => Ok(&mut u.name),
        (Payload::Container(c), Field::Data) => Ok(&mut c.data),
        (other, field) => Err(ScriptError::NoSuchField {
            slot: slot.to_string(),
            field,
            found: other.kind(),
        }),
    }
}
