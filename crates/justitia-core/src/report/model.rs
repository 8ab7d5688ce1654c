use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::rules::catalog::{Policy, RuleId, Severity};
use crate::rules::eval::CaseOutcome;

/// Aggregate result of one (policy, suite) run.
///
/// This struct is the stable JSON contract of the validation engine.
/// It must remain byte-identical for identical inputs, whatever the
/// parallelism used to produce it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuiteReport {
    pub schema_version: String,
    pub policy: PolicyInfo,
    pub total_count: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub fault_count: usize,
    /// `pass_count / total_count`, 0 for an empty suite.
    pub pass_rate: f64,
    /// Mean per-case score, 0 for an empty suite.
    pub average_score: f64,
    /// Distinguishes "no data" from "0% accuracy".
    pub empty_suite: bool,
    pub cases: Vec<CaseOutcome>,
    /// One entry per policy rule, in policy order.
    pub per_rule_stats: Vec<RuleStats>,
    /// Sorted by category name.
    pub category_stats: Vec<CategoryStats>,
}

impl SuiteReport {
    /// Fold ordered case outcomes into the final report.
    ///
    /// Assumes every rule id inside `outcomes` belongs to `policy`.
    pub fn from_outcomes(policy: &Policy, outcomes: Vec<CaseOutcome>) -> Self {
        let mut per_rule_stats: Vec<RuleStats> = policy
            .rules()
            .iter()
            .map(|r| RuleStats::new(r.id.clone(), r.severity))
            .collect();
        let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();

        let mut pass_count = 0;
        let mut fault_count = 0;
        let mut score_sum = 0.0;

        for outcome in &outcomes {
            if outcome.passed {
                pass_count += 1;
            }
            if outcome.is_faulted() {
                fault_count += 1;
            }
            score_sum += outcome.score;

            let stats = per_rule_stats.as_mut_slice();
            tally(policy, stats, &outcome.expected_rule_ids, |s| &mut s.expected);
            tally(policy, stats, &outcome.actual_rule_ids, |s| &mut s.fired);
            tally(policy, stats, &outcome.false_positives, |s| &mut s.false_positive);
            tally(policy, stats, &outcome.false_negatives, |s| &mut s.false_negative);

            let cat = categories
                .entry(outcome.category.clone())
                .or_insert_with(|| CategoryStats::new(outcome.category.clone()));
            cat.total += 1;
            if outcome.passed {
                cat.passed += 1;
            }
            cat.average_score += outcome.score;
        }

        let category_stats = categories
            .into_values()
            .map(|mut c| {
                c.average_score /= c.total as f64;
                c
            })
            .collect();

        let total_count = outcomes.len();
        let empty_suite = total_count == 0;
        if empty_suite {
            tracing::warn!(domain = %policy.domain, "test suite is empty; report carries no data");
        }
        let (pass_rate, average_score) = if empty_suite {
            (0.0, 0.0)
        } else {
            (
                pass_count as f64 / total_count as f64,
                score_sum / total_count as f64,
            )
        };

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            policy: PolicyInfo {
                domain: policy.domain.clone(),
                version: policy.version.clone(),
                rule_count: policy.len(),
            },
            total_count,
            pass_count,
            fail_count: total_count - pass_count,
            fault_count,
            pass_rate,
            average_score,
            empty_suite,
            cases: outcomes,
            per_rule_stats,
            category_stats,
        }
    }

    /// True when no case failed. Holds vacuously for an empty suite.
    pub fn all_passed(&self) -> bool {
        self.fail_count == 0
    }
}

fn tally(policy: &Policy, stats: &mut [RuleStats], ids: &[RuleId], field: fn(&mut RuleStats) -> &mut usize) {
    for id in ids {
        if let Some(i) = policy.position(id) {
            *field(&mut stats[i]) += 1;
        }
    }
}

/// Identity of the policy a report was produced for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyInfo {
    pub domain: String,
    pub version: String,
    pub rule_count: usize,
}

/// Activation counters for one rule across a suite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleStats {
    pub rule_id: RuleId,
    pub severity: Severity,
    pub expected: usize,
    pub fired: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl RuleStats {
    fn new(rule_id: RuleId, severity: Severity) -> Self {
        Self {
            rule_id,
            severity,
            expected: 0,
            fired: 0,
            false_positive: 0,
            false_negative: 0,
        }
    }
}

/// Pass counts and mean score per test-case category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub total: usize,
    pub passed: usize,
    pub average_score: f64,
}

impl CategoryStats {
    fn new(category: String) -> Self {
        Self {
            category,
            total: 0,
            passed: 0,
            average_score: 0.0,
        }
    }
}
