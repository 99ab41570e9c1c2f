//! Scripted memory-defect scenarios for Tenure.
//!
//! A [`Scenario`] is a named, immutable sequence of [`Op`]s (allocate,
//! borrow, transfer, read, free) together with the outcome it is expected
//! to produce. The [`ScenarioRunner`] executes each scenario against fresh
//! [`OwnedSlot`](tenure_slot::OwnedSlot)s, turns the first contract
//! violation into an observed [`Outcome`], and compares it with the
//! expectation.
//!
//! # Run lifecycle
//!
//! ```text
//! Pending ──▶ Running ──▶ Passed
//!                    └──▶ Failed(reason)
//! ```
//!
//! [`catalogue()`] returns the built-in benchmark cases: every classic
//! defect in an instrumented form that must be detected, next to a fixed
//! form that must run clean.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalogue;
pub mod config;
pub mod error;
pub mod frame;
pub mod payload;
pub mod runner;
pub mod script;

pub use catalogue::catalogue;
pub use config::{ConfigError, RunnerConfig};
pub use error::{ExecError, ScriptError};
pub use frame::{Flow, Frame};
pub use payload::{Container, Handler, Payload, User, Value};
pub use runner::{Outcome, Report, RunState, ScenarioReport, ScenarioRunner};
pub use script::{Condition, Expectation, Field, Op, Scenario, ScenarioBuilder};
