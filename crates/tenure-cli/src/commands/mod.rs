//! Command implementations for the `tenure` binary.

pub mod list;
pub mod run;
