//! Test utilities and fixtures for Tenure development.
//!
//! Provides sample values, small ready-made scenarios and assertion
//! helpers shared by the integration tests and benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use tenure_core::DefectKind;
use tenure_scenario::{Outcome, RunnerConfig, Scenario, ScenarioReport, ScenarioRunner};

/// A runner with the default configuration.
pub fn default_runner() -> ScenarioRunner {
    match ScenarioRunner::new(RunnerConfig::default()) {
        Ok(runner) => runner,
        Err(e) => panic!("default config rejected: {e}"),
    }
}

/// Run `scenario` with the default runner.
pub fn run(scenario: &Scenario) -> ScenarioReport {
    default_runner().run(scenario)
}

/// Assert that running `scenario` detects `kind`, whatever it expects.
#[track_caller]
pub fn assert_detects(scenario: &Scenario, kind: DefectKind) -> ScenarioReport {
    let report = run(scenario);
    assert_eq!(
        report.observed.defect(),
        Some(kind),
        "{}: observed {}",
        scenario.name(),
        report.observed
    );
    report
}

/// Assert that running `scenario` completes with no violation and no leak.
#[track_caller]
pub fn assert_clean(scenario: &Scenario) -> ScenarioReport {
    let report = run(scenario);
    assert_eq!(
        report.observed,
        Outcome::Success,
        "{}: observed {}",
        scenario.name(),
        report.observed
    );
    assert!(report.leaks.is_empty(), "{}: leaked {:?}", scenario.name(), report.leaks);
    report
}
