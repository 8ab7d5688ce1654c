//! Policy model: rule identifiers, severities and the compiled rule set.
//!
//! A `PolicyDocument` is the loosely-typed record produced by the policy
//! generator or read from storage. `Policy::compile` turns it into an
//! immutable, validated rule set with every pattern compiled exactly once.
//! Nothing downstream of this module ever sees an uncompiled pattern.

use std::collections::HashMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PolicyLoadError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Reporting weight of a rule. Never alters match semantics.
///
/// Variant order is semantic: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    // Generated policies sometimes use "critical"; it folds into the top level.
    #[serde(alias = "critical")]
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// Regex flags applied to every pattern of a policy at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    pub case_insensitive: bool,
    /// `^`/`$` match at line boundaries.
    pub multi_line: bool,
    /// Upper bound on the compiled program size, in bytes.
    pub size_limit: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            multi_line: true,
            size_limit: None,
        }
    }
}

/// One rule as it appears in a serialized policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSpec {
    pub id: RuleId,
    pub pattern: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Serialized policy, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDocument {
    pub domain: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// An executable policy clause with its pattern already compiled.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    pub pattern: String,
    pub severity: Severity,
    pub description: String,
    pub rationale: Option<String>,
    pub(crate) regex: Regex,
}

impl Rule {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Ordered, immutable rule set for one domain.
#[derive(Debug, Clone)]
pub struct Policy {
    pub domain: String,
    pub version: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    rules: Vec<Rule>,
    positions: HashMap<RuleId, usize>,
}

impl Policy {
    /// Validate a document and compile all of its patterns.
    ///
    /// Fails on the first empty id, duplicate id or non-compiling pattern,
    /// in document order.
    pub fn compile(doc: PolicyDocument, options: &MatchOptions) -> Result<Self, PolicyLoadError> {
        let mut rules = Vec::with_capacity(doc.rules.len());
        let mut positions = HashMap::with_capacity(doc.rules.len());

        for (index, spec) in doc.rules.into_iter().enumerate() {
            if spec.id.as_str().trim().is_empty() {
                return Err(PolicyLoadError::EmptyRuleId { index });
            }
            if positions.contains_key(&spec.id) {
                return Err(PolicyLoadError::DuplicateRuleId(spec.id));
            }

            let mut builder = RegexBuilder::new(&spec.pattern);
            builder
                .case_insensitive(options.case_insensitive)
                .multi_line(options.multi_line);
            if let Some(limit) = options.size_limit {
                builder.size_limit(limit);
            }
            let regex = builder
                .build()
                .map_err(|source| PolicyLoadError::InvalidPattern {
                    rule_id: spec.id.clone(),
                    source,
                })?;

            positions.insert(spec.id.clone(), index);
            rules.push(Rule {
                id: spec.id,
                pattern: spec.pattern,
                severity: spec.severity,
                description: spec.description,
                rationale: spec.rationale,
                regex,
            });
        }

        Ok(Self {
            domain: doc.domain,
            version: doc.version,
            metadata: doc.metadata,
            rules,
            positions,
        })
    }

    /// Rules in policy order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: &RuleId) -> Option<&Rule> {
        self.position(id).map(|i| &self.rules[i])
    }

    /// Index of `id` in policy order.
    pub fn position(&self, id: &RuleId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &RuleId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(id: &str, pattern: &str) -> RuleSpec {
        RuleSpec {
            id: RuleId::from(id),
            pattern: pattern.into(),
            severity: Severity::High,
            description: "d".into(),
            rationale: None,
        }
    }

    fn doc(rules: Vec<RuleSpec>) -> PolicyDocument {
        PolicyDocument {
            domain: "content-moderation".into(),
            version: "1.0".into(),
            rules,
            metadata: Default::default(),
        }
    }

    #[test]
    fn severity_ordering_is_semantic() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn critical_severity_is_read_as_high() {
        let s: Severity = serde_json::from_value(json!("critical")).unwrap();
        assert_eq!(s, Severity::High);
        assert_eq!(serde_json::to_value(s).unwrap(), json!("high"));
    }

    #[test]
    fn document_defaults_are_applied() {
        let d: PolicyDocument = serde_json::from_value(json!({
            "domain": "code-review",
            "rules": [{ "id": "r1", "pattern": "x", "threshold": 0.5 }]
        }))
        .unwrap();
        assert_eq!(d.version, "1.0");
        assert_eq!(d.rules[0].severity, Severity::Medium);
        assert!(d.rules[0].description.is_empty());
        assert!(d.metadata.is_empty());
    }

    #[test]
    fn compile_preserves_rule_order() {
        let p = Policy::compile(
            doc(vec![spec("b", "b"), spec("a", "a"), spec("c", "c")]),
            &MatchOptions::default(),
        )
        .unwrap();
        let ids: Vec<&str> = p.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(p.position(&RuleId::from("a")), Some(1));
        assert!(p.rule(&RuleId::from("zzz")).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Policy::compile(
            doc(vec![spec("r1", "a"), spec("r1", "b")]),
            &MatchOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PolicyLoadError::DuplicateRuleId(ref id) if id.as_str() == "r1"));
    }

    #[test]
    fn invalid_pattern_is_rejected_at_load() {
        let err = Policy::compile(
            doc(vec![spec("ok", "fine"), spec("broken", "(unclosed")]),
            &MatchOptions::default(),
        )
        .unwrap_err();
        match err {
            PolicyLoadError::InvalidPattern { rule_id, .. } => assert_eq!(rule_id.as_str(), "broken"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = Policy::compile(doc(vec![spec("  ", "x")]), &MatchOptions::default()).unwrap_err();
        assert!(matches!(err, PolicyLoadError::EmptyRuleId { index: 0 }));
    }

    #[test]
    fn empty_policy_is_valid() {
        let p = Policy::compile(doc(vec![]), &MatchOptions::default()).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn match_options_control_flags() {
        let opts = MatchOptions {
            case_insensitive: false,
            ..Default::default()
        };
        let p = Policy::compile(doc(vec![spec("r1", "hate")]), &opts).unwrap();
        assert!(!p.rules()[0].regex().is_match("HATE"));

        let p = Policy::compile(doc(vec![spec("r1", "hate")]), &MatchOptions::default()).unwrap();
        assert!(p.rules()[0].regex().is_match("HATE"));
    }

    #[test]
    fn size_limit_is_enforced_at_load() {
        let opts = MatchOptions {
            size_limit: Some(16),
            ..Default::default()
        };
        let err = Policy::compile(doc(vec![spec("big", r"\w{100}")]), &opts).unwrap_err();
        assert!(matches!(err, PolicyLoadError::InvalidPattern { .. }));
    }
}
