//! Case evaluation: expected vs. actual rule activations for one test case.
//!
//! Responsibilities:
//! - Run every rule of a policy against the case text
//! - Derive true positives, false positives and false negatives
//! - Score the overlap and decide pass/fail
//! - Contain matcher faults so one pathological case cannot take down a run
//!
//! Rule-id lists in an outcome are always emitted in policy order, so the
//! order in which rules fire never shows up in the output.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::{EvaluationFault, SuiteConfigurationError};
use crate::rules::catalog::{Policy, RuleId};
use crate::rules::matcher::{Matcher, RegexMatcher};
use crate::util::deterministic::policy_ordered;

fn default_category() -> String {
    "general".to_string()
}

/// One labeled example.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub id: String,
    pub text: String,
    /// Rules that should fire on `text`. Empty means "expected clean".
    #[serde(alias = "expected_violations", default)]
    pub expected_rule_ids: BTreeSet<RuleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

impl TestCase {
    pub fn new<I, S>(id: impl Into<String>, text: impl Into<String>, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RuleId>,
    {
        Self {
            id: id.into(),
            text: text.into(),
            expected_rule_ids: expected.into_iter().map(Into::into).collect(),
            description: None,
            category: default_category(),
        }
    }
}

/// Result of evaluating one test case against one policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseOutcome {
    pub case_id: String,
    pub category: String,
    pub expected_rule_ids: Vec<RuleId>,
    pub actual_rule_ids: Vec<RuleId>,
    pub true_positives: Vec<RuleId>,
    pub false_positives: Vec<RuleId>,
    pub false_negatives: Vec<RuleId>,
    pub score: f64,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl CaseOutcome {
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

/// Set-level F1 between expected and actual activations.
///
/// A clean case scores 1.0 when nothing fired and 0.0 otherwise.
pub fn overlap_score(true_pos: usize, false_pos: usize, false_neg: usize, expected_empty: bool) -> f64 {
    if expected_empty {
        return if false_pos == 0 { 1.0 } else { 0.0 };
    }
    let tp2 = 2.0 * true_pos as f64;
    let denom = tp2 + false_pos as f64 + false_neg as f64;
    if denom == 0.0 { 1.0 } else { tp2 / denom }
}

/// Reject a case that expects a rule the policy does not define.
pub fn check_references(policy: &Policy, case: &TestCase) -> Result<(), SuiteConfigurationError> {
    match case.expected_rule_ids.iter().find(|id| !policy.contains(id)) {
        Some(id) => Err(SuiteConfigurationError::UnknownRuleReference {
            case_id: case.id.clone(),
            rule_id: id.clone(),
        }),
        None => Ok(()),
    }
}

/// Evaluate one case with the default regex matcher.
pub fn evaluate(policy: &Policy, case: &TestCase) -> Result<CaseOutcome, SuiteConfigurationError> {
    evaluate_with(policy, case, &RegexMatcher)
}

/// Evaluate one case with an explicit matcher.
pub fn evaluate_with<M: Matcher + ?Sized>(
    policy: &Policy,
    case: &TestCase,
    matcher: &M,
) -> Result<CaseOutcome, SuiteConfigurationError> {
    check_references(policy, case)?;
    Ok(evaluate_checked(policy, case, matcher))
}

/// Evaluation for a case whose references are already known to resolve.
pub(crate) fn evaluate_checked<M: Matcher + ?Sized>(
    policy: &Policy,
    case: &TestCase,
    matcher: &M,
) -> CaseOutcome {
    let expected = policy_ordered(policy, &case.expected_rule_ids);

    let fired = panic::catch_unwind(AssertUnwindSafe(|| activations(policy, case, matcher)))
        .unwrap_or_else(|payload| Err(EvaluationFault::new(panic_message(payload.as_ref()))));

    let actual = match fired {
        Ok(actual) => actual,
        Err(fault) => {
            tracing::warn!(case_id = %case.id, %fault, "case evaluation faulted");
            return CaseOutcome {
                case_id: case.id.clone(),
                category: case.category.clone(),
                expected_rule_ids: expected,
                actual_rule_ids: vec![],
                true_positives: vec![],
                false_positives: vec![],
                false_negatives: vec![],
                score: 0.0,
                passed: false,
                fault: Some(fault.message),
            };
        }
    };

    let actual_set: BTreeSet<&RuleId> = actual.iter().collect();

    let true_positives: Vec<RuleId> = actual
        .iter()
        .filter(|id| case.expected_rule_ids.contains(*id))
        .cloned()
        .collect();
    let false_positives: Vec<RuleId> = actual
        .iter()
        .filter(|id| !case.expected_rule_ids.contains(*id))
        .cloned()
        .collect();
    let false_negatives: Vec<RuleId> = expected
        .iter()
        .filter(|id| !actual_set.contains(id))
        .cloned()
        .collect();

    let score = overlap_score(
        true_positives.len(),
        false_positives.len(),
        false_negatives.len(),
        expected.is_empty(),
    );
    let passed = false_positives.is_empty() && false_negatives.is_empty();

    tracing::debug!(
        case_id = %case.id,
        fired = actual.len(),
        score,
        passed,
        "case evaluated"
    );

    CaseOutcome {
        case_id: case.id.clone(),
        category: case.category.clone(),
        expected_rule_ids: expected,
        actual_rule_ids: actual,
        true_positives,
        false_positives,
        false_negatives,
        score,
        passed,
        fault: None,
    }
}

fn activations<M: Matcher + ?Sized>(
    policy: &Policy,
    case: &TestCase,
    matcher: &M,
) -> Result<Vec<RuleId>, EvaluationFault> {
    let mut fired = Vec::new();
    for rule in policy.rules() {
        if matcher.try_match(rule, &case.text)? {
            fired.push(rule.id.clone());
        }
    }
    Ok(fired)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic during matching: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic during matching: {s}")
    } else {
        "panic during matching".to_string()
    }
}
