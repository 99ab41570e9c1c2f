//! Runner configuration and validation.

use std::error::Error;
use std::fmt;

/// Configuration for a [`ScenarioRunner`](crate::ScenarioRunner).
///
/// Validated once at runner construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Only run scenarios whose name contains this substring.
    /// `None` runs everything. Default: `None`.
    pub filter: Option<String>,
    /// Stop after the first failed scenario. Remaining scenarios are
    /// counted as skipped. Default: `false`.
    pub fail_fast: bool,
    /// Report tracked slots still live at the end of a run as a leak.
    /// Default: `true`.
    pub detect_leaks: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            filter: None,
            fail_fast: false,
            detect_leaks: true,
        }
    }
}

impl RunnerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(filter) = &self.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::EmptyFilter);
            }
        }
        Ok(())
    }

    /// Whether `name` passes the filter.
    pub fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|f| name.contains(f))
    }
}

/// Errors detected during [`RunnerConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The name filter is empty or whitespace; it would match everything
    /// and is almost certainly a typo.
    EmptyFilter,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFilter => write!(f, "scenario filter must not be empty"),
        }
    }
}

impl Error for ConfigError {}
