pub mod error;
pub mod load;
pub mod report;
pub mod rules;
pub mod suite;
pub mod util;

use anyhow::Result;
use std::path::Path;

use crate::report::model::SuiteReport;
use crate::rules::catalog::MatchOptions;
use crate::rules::matcher::RegexMatcher;
use crate::suite::runner::RunOptions;

pub const TOOL_NAME: &str = "justitia";

/// JSON schema version of suite reports.
/// This must be bumped only when the report layout changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Everything that tunes a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    pub matching: MatchOptions,
    pub run: RunOptions,
}

/// Load a policy and a suite from disk and run the suite against it.
pub fn validate_files(policy_path: &Path, cases_path: &Path, config: &ValidationConfig) -> Result<SuiteReport> {
    let policy = load::load_policy(policy_path, &config.matching)?;
    let suite = load::load_suite(cases_path)?;
    let report = suite::runner::run_with(&policy, &suite, &config.run, &RegexMatcher)?;
    Ok(report)
}
