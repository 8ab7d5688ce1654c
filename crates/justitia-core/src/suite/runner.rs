//! Suite runner: validates a suite against a policy, fans case evaluation
//! out over a worker pool and folds the outcomes into a `SuiteReport`.
//!
//! Cases share no mutable state. The only synchronization points are the
//! cancellation flag, polled before each case is dispatched, and the final
//! join that hands the ordered outcomes to the report fold.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::error::{RunError, SuiteConfigurationError};
use crate::report::model::SuiteReport;
use crate::rules::catalog::Policy;
use crate::rules::eval::{CaseOutcome, check_references, evaluate_checked};
use crate::rules::matcher::{Matcher, RegexMatcher};
use crate::suite::model::TestSuite;

/// How case evaluations are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Evaluate on the calling thread, in suite order.
    Sequential,
    /// Rayon's global pool, sized to available CPUs.
    #[default]
    Auto,
    /// A dedicated pool with exactly this many workers.
    Threads(NonZeroUsize),
}

/// Shared early-abort flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub parallelism: Parallelism,
    pub cancel: CancelToken,
}

/// Fail-fast referential integrity check, in suite order.
///
/// Reports the first duplicate case id or the first dangling rule reference.
pub fn validate_suite(policy: &Policy, suite: &TestSuite) -> Result<(), SuiteConfigurationError> {
    suite.check_unique_ids()?;
    suite
        .test_cases
        .iter()
        .try_for_each(|case| check_references(policy, case))
}

/// Run a suite with default options and the regex matcher.
pub fn run(policy: &Policy, suite: &TestSuite) -> Result<SuiteReport, RunError> {
    run_with(policy, suite, &RunOptions::default(), &RegexMatcher)
}

/// Run a suite with explicit scheduling options and matcher.
///
/// No report is produced unless every case was evaluated: configuration
/// errors abort before dispatch and cancellation discards partial results.
pub fn run_with<M: Matcher>(
    policy: &Policy,
    suite: &TestSuite,
    options: &RunOptions,
    matcher: &M,
) -> Result<SuiteReport, RunError> {
    validate_suite(policy, suite)?;

    tracing::info!(
        domain = %policy.domain,
        rules = policy.len(),
        cases = suite.len(),
        parallelism = ?options.parallelism,
        "running policy suite"
    );

    let cancel = &options.cancel;
    let outcomes = match options.parallelism {
        Parallelism::Sequential => evaluate_sequential(policy, suite, cancel, matcher),
        Parallelism::Auto => evaluate_parallel(policy, suite, cancel, matcher),
        Parallelism::Threads(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n.get())
                .build()?;
            pool.install(|| evaluate_parallel(policy, suite, cancel, matcher))
        }
    };

    // A cancel that lands after the last dispatch still voids the run.
    let outcomes = match outcomes {
        Some(outcomes) if !cancel.is_cancelled() => outcomes,
        _ => {
            tracing::warn!(domain = %policy.domain, "suite run cancelled; discarding partial results");
            return Err(RunError::Cancelled);
        }
    };

    let report = SuiteReport::from_outcomes(policy, outcomes);

    tracing::info!(
        total = report.total_count,
        passed = report.pass_count,
        faulted = report.fault_count,
        pass_rate = report.pass_rate,
        average_score = report.average_score,
        "suite run complete"
    );

    Ok(report)
}

fn evaluate_sequential<M: Matcher>(
    policy: &Policy,
    suite: &TestSuite,
    cancel: &CancelToken,
    matcher: &M,
) -> Option<Vec<CaseOutcome>> {
    suite
        .test_cases
        .iter()
        .map(|case| (!cancel.is_cancelled()).then(|| evaluate_checked(policy, case, matcher)))
        .collect()
}

fn evaluate_parallel<M: Matcher>(
    policy: &Policy,
    suite: &TestSuite,
    cancel: &CancelToken,
    matcher: &M,
) -> Option<Vec<CaseOutcome>> {
    // Indexed collect keeps suite order regardless of completion order.
    suite
        .test_cases
        .par_iter()
        .map(|case| (!cancel.is_cancelled()).then(|| evaluate_checked(policy, case, matcher)))
        .collect()
}
