//! Error taxonomy for policy loading and suite validation.
//!
//! Load-time and configuration errors abort the operation that raised them.
//! `EvaluationFault` is the exception: it is contained per case and surfaces
//! inside the report instead of being propagated.

use thiserror::Error;

use crate::rules::catalog::RuleId;

/// A policy could not be turned into an executable rule set.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("rule at position {index} has an empty id")]
    EmptyRuleId { index: usize },

    #[error("duplicate rule id `{0}`")]
    DuplicateRuleId(RuleId),

    #[error("rule `{rule_id}` has an invalid pattern: {source}")]
    InvalidPattern {
        rule_id: RuleId,
        #[source]
        source: regex::Error,
    },
}

/// A test suite does not line up with the policy it is run against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiteConfigurationError {
    #[error("test case `{case_id}` expects unknown rule `{rule_id}`")]
    UnknownRuleReference { case_id: String, rule_id: RuleId },

    #[error("duplicate test case id `{case_id}`")]
    DuplicateCaseId { case_id: String },
}

/// Unexpected failure while executing patterns for one case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("evaluation fault: {message}")]
pub struct EvaluationFault {
    pub message: String,
}

impl EvaluationFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reasons a suite run produced no report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] SuiteConfigurationError),

    #[error("suite run was cancelled")]
    Cancelled,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
