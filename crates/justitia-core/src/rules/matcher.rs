//! Pattern matching for a single rule.
//!
//! Patterns are compiled once at policy load; this module only executes
//! them. Everything here is read-only and safe to call from many worker
//! threads at once.

use crate::error::EvaluationFault;
use crate::rules::catalog::Rule;

/// True iff the rule's pattern matches anywhere in `text`.
///
/// Search semantics: a pattern is only anchored if it says so itself.
pub fn matches(rule: &Rule, text: &str) -> bool {
    rule.regex.is_match(text)
}

/// Executes one rule against one text.
///
/// Implementations must be free of shared mutable state; the suite runner
/// calls them concurrently.
pub trait Matcher: Sync {
    fn try_match(&self, rule: &Rule, text: &str) -> Result<bool, EvaluationFault>;
}

/// Default matcher backed by the rule's compiled regex.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexMatcher;

impl Matcher for RegexMatcher {
    fn try_match(&self, rule: &Rule, text: &str) -> Result<bool, EvaluationFault> {
        Ok(matches(rule, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{MatchOptions, Policy, PolicyDocument, RuleId, RuleSpec, Severity};

    fn policy(patterns: &[(&str, &str)]) -> Policy {
        let doc = PolicyDocument {
            domain: "test".into(),
            version: "1.0".into(),
            rules: patterns
                .iter()
                .map(|(id, p)| RuleSpec {
                    id: RuleId::from(*id),
                    pattern: p.to_string(),
                    severity: Severity::Low,
                    description: String::new(),
                    rationale: None,
                })
                .collect(),
            metadata: Default::default(),
        };
        Policy::compile(doc, &MatchOptions::default()).unwrap()
    }

    #[test]
    fn search_semantics_not_full_match() {
        let p = policy(&[("r1", "hate")]);
        assert!(matches(&p.rules()[0], "I hate those people"));
        assert!(!matches(&p.rules()[0], "I love everyone"));
    }

    #[test]
    fn anchors_in_pattern_are_honoured_per_line() {
        let p = policy(&[("r1", "^API_KEY")]);
        assert!(matches(&p.rules()[0], "x = 1\nAPI_KEY = 'sk-1'"));
        assert!(!matches(&p.rules()[0], "my API_KEY"));
    }

    #[test]
    fn empty_text_is_valid_input() {
        let p = policy(&[("r1", "hate"), ("r2", "^$")]);
        assert!(!matches(&p.rules()[0], ""));
        assert!(matches(&p.rules()[1], ""));
    }

    #[test]
    fn regex_matcher_never_faults() {
        let p = policy(&[("r1", r"\bdie\b")]);
        assert_eq!(RegexMatcher.try_match(&p.rules()[0], "they should all die"), Ok(true));
    }
}
