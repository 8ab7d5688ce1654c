use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::rules::catalog::{MatchOptions, Policy, PolicyDocument};
use crate::suite::model::TestSuite;

/// Read a policy JSON document and compile it.
///
/// I/O and JSON errors carry the path; compile errors keep their
/// `PolicyLoadError` as the source so callers can downcast.
pub fn load_policy(path: &Path, options: &MatchOptions) -> Result<Policy> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read policy: {}", path.display()))?;
    let doc: PolicyDocument = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse policy: {}", path.display()))?;
    let policy = Policy::compile(doc, options)
        .with_context(|| format!("failed to load policy: {}", path.display()))?;
    tracing::debug!(path = %path.display(), domain = %policy.domain, rules = policy.len(), "policy loaded");
    Ok(policy)
}

/// Read a test suite JSON document.
pub fn load_suite(path: &Path) -> Result<TestSuite> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read test cases: {}", path.display()))?;
    let suite = TestSuite::from_json_str(&raw)
        .with_context(|| format!("failed to parse test cases: {}", path.display()))?;
    tracing::debug!(path = %path.display(), cases = suite.len(), "test suite loaded");
    Ok(suite)
}
