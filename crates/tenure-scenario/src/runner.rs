//! Scenario execution and verdicts.
//!
//! The runner is a verification tool, not a resilient service: every
//! contract violation is caught at the scenario boundary and turned into an
//! observed [`Outcome`], every mismatch with the expectation is reported,
//! and nothing is retried.

use std::fmt;

use tenure_core::DefectKind;
use tenure_slot::{Ledger, LedgerSummary};

use crate::config::{ConfigError, RunnerConfig};
use crate::error::{ExecError, ScriptError};
use crate::frame::Frame;
use crate::script::{Expectation, Scenario};

/// Lifecycle of one scenario run.
///
/// ```text
/// Pending ──start──▶ Running ──conclude──▶ Passed | Failed(reason)
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not started yet.
    #[default]
    Pending,
    /// Executing ops.
    Running,
    /// Observed outcome matched the expectation.
    Passed,
    /// Observed outcome did not match; the reason says how.
    Failed(String),
}

impl RunState {
    /// `Pending → Running`. Any other state is returned unchanged.
    #[must_use]
    pub fn start(self) -> Self {
        match self {
            Self::Pending => Self::Running,
            other => other,
        }
    }

    /// `Running → Passed | Failed`. Any other state is returned unchanged.
    #[must_use]
    pub fn conclude(self, expected: Expectation, observed: &Outcome) -> Self {
        match self {
            Self::Running => {
                if observed.satisfies(expected) {
                    Self::Passed
                } else {
                    Self::Failed(format!("expected {expected}, observed {observed}"))
                }
            }
            other => other,
        }
    }

    /// Whether the run has reached a verdict.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed(_))
    }

    /// Whether the run passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Passed => write!(f, "PASS"),
            Self::Failed(reason) => write!(f, "FAIL: {reason}"),
        }
    }
}

/// What a run actually produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No violation and no leak.
    Success,
    /// A defect was detected.
    Detected {
        /// The defect category.
        kind: DefectKind,
        /// Human-readable detail (the violation message or leaked slots).
        detail: String,
    },
    /// A contract violation with no defect counterpart.
    Violation(String),
    /// The script itself was malformed.
    Script(String),
}

impl Outcome {
    /// Whether this outcome meets `expected`.
    pub fn satisfies(&self, expected: Expectation) -> bool {
        match (self, expected) {
            (Self::Success, Expectation::Success) => true,
            (Self::Detected { kind, .. }, Expectation::Detected(want)) => *kind == want,
            _ => false,
        }
    }

    /// The detected defect, if any.
    pub fn defect(&self) -> Option<DefectKind> {
        match self {
            Self::Detected { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Detail text for non-success outcomes.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Detected { detail, .. } => Some(detail),
            Self::Violation(msg) | Self::Script(msg) => Some(msg),
        }
    }

    fn from_error(err: ExecError) -> Self {
        match err {
            ExecError::Slot(e) => match DefectKind::from_error(&e) {
                Some(kind) => Self::Detected {
                    kind,
                    detail: e.to_string(),
                },
                None => Self::Violation(e.to_string()),
            },
            ExecError::Script(e) => Self::Script(e.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Detected { kind, .. } => write!(f, "{kind}"),
            Self::Violation(msg) => write!(f, "violation ({msg})"),
            Self::Script(msg) => write!(f, "script error ({msg})"),
        }
    }
}

/// Result of running one scenario.
#[derive(Clone, Debug)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Expected outcome.
    pub expected: Expectation,
    /// Observed outcome.
    pub observed: Outcome,
    /// Final run state (`Passed` or `Failed`).
    pub state: RunState,
    /// Ledger counters at the end of the run.
    pub ledger: LedgerSummary,
    /// Labels of slots that leaked.
    pub leaks: Vec<String>,
    /// Number of ops executed, including nested ones.
    pub ops_executed: usize,
}

impl ScenarioReport {
    /// Whether the scenario passed.
    pub fn passed(&self) -> bool {
        self.state.is_passed()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            RunState::Failed(reason) => write!(f, "FAIL {}: {reason}", self.name),
            state => write!(f, "{state} {}", self.name),
        }
    }
}

/// Results of a batch of scenarios, in execution order.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// Per-scenario results.
    pub scenarios: Vec<ScenarioReport>,
    /// Scenarios not run because of `fail_fast`.
    pub skipped: usize,
}

impl Report {
    /// Number of passed scenarios.
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    /// Number of failed scenarios.
    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    /// Whether every scenario that ran passed and none was skipped.
    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.skipped == 0
    }

    /// Process exit status: 0 iff [`all_passed`](Self::all_passed).
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/// Executes scenarios against fresh slots and produces verdicts.
#[derive(Clone, Debug)]
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Create a runner, validating `config`.
    pub fn new(config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The runner's configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one scenario in a fresh frame.
    pub fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let mut state = RunState::Pending.start();
        let ledger = Ledger::new();

        let (result, ops_executed) = if scenario.steps().is_empty() {
            (Err(ExecError::Script(ScriptError::EmptyScenario)), 0)
        } else {
            let mut frame = Frame::new(ledger.clone());
            let result = frame.run(scenario.steps());
            (result, frame.executed())
            // The frame drops here: tracked slots still live become leaks.
        };

        let leaks = ledger.leaks();
        let observed = match result {
            Err(err) => Outcome::from_error(err),
            Ok(_) if self.config.detect_leaks && !leaks.is_empty() => Outcome::Detected {
                kind: DefectKind::Leak,
                detail: format!("never freed: {}", leaks.join(", ")),
            },
            Ok(_) => Outcome::Success,
        };

        state = state.conclude(scenario.expected(), &observed);
        match &state {
            RunState::Passed => {
                tracing::info!(scenario = scenario.name(), observed = %observed, "passed")
            }
            _ => tracing::warn!(scenario = scenario.name(), "{state}"),
        }

        ScenarioReport {
            name: scenario.name().to_string(),
            expected: scenario.expected(),
            observed,
            state,
            ledger: ledger.summary(),
            leaks,
            ops_executed,
        }
    }

    /// Run every scenario selected by the filter, in order.
    pub fn run_all<'a>(&self, scenarios: impl IntoIterator<Item = &'a Scenario>) -> Report {
        let mut report = Report::default();
        let mut stopped = false;
        for scenario in scenarios
            .into_iter()
            .filter(|s| self.config.selects(s.name()))
        {
            if stopped {
                report.skipped += 1;
                continue;
            }
            let result = self.run(scenario);
            stopped = self.config.fail_fast && !result.passed();
            report.scenarios.push(result);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Value;
    use crate::script::{Condition, Op};

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(RunnerConfig::default()).unwrap()
    }

    #[test]
    fn state_transitions_only_move_forward() {
        let s = RunState::Pending;
        assert_eq!(s.clone().conclude(Expectation::Success, &Outcome::Success), RunState::Pending);
        let running = s.start();
        assert_eq!(running, RunState::Running);
        let done = running.conclude(Expectation::Success, &Outcome::Success);
        assert_eq!(done, RunState::Passed);
        assert_eq!(done.clone().start(), RunState::Passed);
        assert!(done.is_terminal());
    }

    #[test]
    fn mismatch_reason_names_both_sides() {
        let state = RunState::Running.conclude(
            Expectation::Detected(DefectKind::UseAfterFree),
            &Outcome::Success,
        );
        assert_eq!(
            state,
            RunState::Failed("expected use-after-free, observed success".into())
        );
    }

    #[test]
    fn clean_script_passes() {
        let scenario = Scenario::builder("clean")
            .steps([
                Op::construct("a", Value::Int(1)),
                Op::read("a"),
                Op::reset("a"),
            ])
            .build();
        let report = runner().run(&scenario);
        assert!(report.passed(), "{report}");
        assert_eq!(report.observed, Outcome::Success);
        assert_eq!(report.ledger.allocations, 1);
        assert_eq!(report.ledger.frees, 1);
        assert_eq!(report.ops_executed, 3);
        assert_eq!(report.to_string(), "PASS clean");
    }

    #[test]
    fn violation_is_detected() {
        let scenario = Scenario::builder("df")
            .detects(DefectKind::DoubleFree)
            .steps([
                Op::construct("a", Value::Int(1)),
                Op::reset("a"),
                Op::reset("a"),
            ])
            .build();
        let report = runner().run(&scenario);
        assert!(report.passed(), "{report}");
        assert_eq!(report.observed.defect(), Some(DefectKind::DoubleFree));
    }

    #[test]
    fn leak_detected_at_scope_end() {
        let scenario = Scenario::builder("leak")
            .detects(DefectKind::Leak)
            .steps([
                Op::construct("buffer", Value::buffer(100)),
                Op::when(Condition::Flag(true), [Op::Return]),
                Op::reset("buffer"),
            ])
            .build();
        let report = runner().run(&scenario);
        assert!(report.passed(), "{report}");
        assert_eq!(report.leaks, vec!["buffer".to_string()]);
    }

    #[test]
    fn leak_check_can_be_disabled() {
        let config = RunnerConfig {
            detect_leaks: false,
            ..RunnerConfig::default()
        };
        let scenario = Scenario::builder("leak")
            .step(Op::construct("buffer", Value::buffer(1)))
            .build();
        let report = ScenarioRunner::new(config).unwrap().run(&scenario);
        assert_eq!(report.observed, Outcome::Success);
        assert_eq!(report.leaks.len(), 1);
    }

    #[test]
    fn empty_scenario_fails() {
        let report = runner().run(&Scenario::builder("nothing").build());
        assert!(!report.passed());
        assert!(matches!(report.observed, Outcome::Script(_)));
    }

    #[test]
    fn script_error_never_passes() {
        let scenario = Scenario::builder("typo")
            .detects(DefectKind::NullDereference)
            .step(Op::read("undeclared"))
            .build();
        let report = runner().run(&scenario);
        assert!(!report.passed());
        assert_eq!(
            report.to_string(),
            "FAIL typo: expected null-deref, observed script error (unknown slot 'undeclared')"
        );
    }

    #[test]
    fn fail_fast_skips_the_rest() {
        let bad = Scenario::builder("bad")
            .detects(DefectKind::Leak)
            .step(Op::declare("x"))
            .build();
        let good = Scenario::builder("good").step(Op::declare("y")).build();
        let config = RunnerConfig {
            fail_fast: true,
            ..RunnerConfig::default()
        };
        let report = ScenarioRunner::new(config)
            .unwrap()
            .run_all([&bad, &good, &good]);
        assert_eq!(report.scenarios.len(), 1);
        assert_eq!(report.skipped, 2);
        assert!(!report.all_passed());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn filter_limits_scenarios() {
        let a = Scenario::builder("uaf-a").step(Op::declare("x")).build();
        let b = Scenario::builder("mlk-b").step(Op::declare("x")).build();
        let config = RunnerConfig {
            filter: Some("uaf".into()),
            ..RunnerConfig::default()
        };
        let report = ScenarioRunner::new(config).unwrap().run_all([&a, &b]);
        assert_eq!(report.scenarios.len(), 1);
        assert_eq!(report.scenarios[0].name, "uaf-a");
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = RunnerConfig {
            filter: Some(String::new()),
            ..RunnerConfig::default()
        };
        assert_eq!(
            ScenarioRunner::new(config).unwrap_err(),
            ConfigError::EmptyFilter
        );
    }
}
