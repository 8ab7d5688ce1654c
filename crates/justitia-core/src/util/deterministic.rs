//! Deterministic ordering helpers.
//!
//! Rule-id lists that reach a report are ordered by the policy, never by
//! hash order, set order or the order in which workers finished. Identical
//! inputs therefore always produce identical, diffable reports.

use std::collections::BTreeSet;

use crate::rules::catalog::{Policy, RuleId};

/// Members of `ids` that the policy defines, in policy order.
///
/// Ids unknown to the policy are dropped; callers validate references first.
pub fn policy_ordered(policy: &Policy, ids: &BTreeSet<RuleId>) -> Vec<RuleId> {
    policy
        .rules()
        .iter()
        .filter(|r| ids.contains(&r.id))
        .map(|r| r.id.clone())
        .collect()
}
