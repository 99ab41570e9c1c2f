use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tenure::prelude::*;
use tenure::scenario::ScenarioReport;

use crate::Format;

/// Run the catalogue and print the verdicts. Returns the process exit code.
pub fn run(
    filter: Option<String>,
    fail_fast: bool,
    no_leak_check: bool,
    format: Format,
) -> Result<i32> {
    let config = RunnerConfig {
        filter,
        fail_fast,
        detect_leaks: !no_leak_check,
    };
    let runner = ScenarioRunner::new(config).context("invalid runner configuration")?;
    let report = runner.run_all(&catalogue());
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        skipped = report.skipped,
        "run finished"
    );

    match format {
        Format::Text => print_text(&mut io::stdout().lock(), &report)
            .context("failed to write report")?,
        Format::Json => {
            let doc = JsonReport::from(&report);
            println!(
                "{}",
                serde_json::to_string_pretty(&doc).context("failed to serialize report")?
            );
        }
    }
    Ok(report.exit_code())
}

fn print_text(out: &mut impl Write, report: &Report) -> io::Result<()> {
    for scenario in &report.scenarios {
        writeln!(out, "{scenario}")?;
    }
    writeln!(
        out,
        "{} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    passed: usize,
    failed: usize,
    skipped: usize,
    scenarios: Vec<JsonScenario<'a>>,
}

#[derive(Serialize)]
struct JsonScenario<'a> {
    name: &'a str,
    verdict: &'static str,
    expected: String,
    observed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwe: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    leaks: &'a [String],
    allocations: u64,
    frees: u64,
    ops_executed: usize,
}

impl<'a> From<&'a Report> for JsonReport<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            passed: report.passed(),
            failed: report.failed(),
            skipped: report.skipped,
            scenarios: report.scenarios.iter().map(JsonScenario::from).collect(),
        }
    }
}

impl<'a> From<&'a ScenarioReport> for JsonScenario<'a> {
    fn from(s: &'a ScenarioReport) -> Self {
        let reason = match &s.state {
            RunState::Failed(reason) => Some(reason.as_str()),
            _ => None,
        };
        Self {
            name: &s.name,
            verdict: if s.passed() { "PASS" } else { "FAIL" },
            expected: s.expected.to_string(),
            observed: s.observed.to_string(),
            reason,
            cwe: s.observed.defect().map(DefectKind::cwe),
            detail: s.observed.detail(),
            leaks: &s.leaks,
            allocations: s.ledger.allocations,
            frees: s.ledger.frees,
            ops_executed: s.ops_executed,
        }
    }
}
