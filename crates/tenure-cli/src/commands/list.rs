use anyhow::Result;
use tenure::prelude::*;

/// Print every built-in scenario with its expectation and CWE id.
pub fn run() -> Result<()> {
    let scenarios = catalogue();
    let width = scenarios.iter().map(|s| s.name().len()).max().unwrap_or(0);
    for scenario in &scenarios {
        let cwe = match scenario.expected() {
            Expectation::Detected(kind) => kind.cwe(),
            Expectation::Success => "-",
        };
        println!(
            "{:width$}  {:16}  {:8}  {}",
            scenario.name(),
            scenario.expected().to_string(),
            cwe,
            scenario.description(),
        );
    }
    Ok(())
}
