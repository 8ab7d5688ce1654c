use crate::TOOL_NAME;
use crate::report::model::SuiteReport;
use crate::rules::catalog::RuleId;

fn join(ids: &[RuleId]) -> String {
    ids.iter().map(RuleId::as_str).collect::<Vec<_>>().join(", ")
}

pub fn render_text(report: &SuiteReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} policy test results: {} (v{}, {} rules)\n\n",
        TOOL_NAME, report.policy.domain, report.policy.version, report.policy.rule_count
    ));

    let id_width = report
        .cases
        .iter()
        .map(|c| c.case_id.chars().count())
        .max()
        .unwrap_or(0)
        .max("TEST ID".len());

    out.push_str(&format!(
        "{:<id_width$}  {:<6}  {:>5}  {:<24}  {}\n",
        "TEST ID", "STATUS", "SCORE", "ACTIVATED", "ISSUES"
    ));
    for case in &report.cases {
        let status = match (case.passed, case.is_faulted()) {
            (_, true) => "FAULT",
            (true, false) => "PASS",
            (false, false) => "FAIL",
        };
        let activated = if case.actual_rule_ids.is_empty() {
            "none".to_string()
        } else {
            join(&case.actual_rule_ids)
        };

        let mut issues = Vec::new();
        if let Some(fault) = &case.fault {
            issues.push(fault.clone());
        }
        if !case.false_positives.is_empty() {
            issues.push(format!("FP: {}", join(&case.false_positives)));
        }
        if !case.false_negatives.is_empty() {
            issues.push(format!("FN: {}", join(&case.false_negatives)));
        }
        let issues = if issues.is_empty() {
            "none".to_string()
        } else {
            issues.join("; ")
        };

        out.push_str(&format!(
            "{:<id_width$}  {:<6}  {:>5.2}  {:<24}  {}\n",
            case.case_id, status, case.score, activated, issues
        ));
    }

    out.push('\n');
    if report.empty_suite {
        out.push_str("Suite is empty: no cases were evaluated.\n");
    }
    out.push_str(&format!("Tests: {}\n", report.total_count));
    out.push_str(&format!(
        "Passed: {} ({:.1}%)\n",
        report.pass_count,
        report.pass_rate * 100.0
    ));
    out.push_str(&format!("Failed: {}\n", report.fail_count));
    if report.fault_count > 0 {
        out.push_str(&format!("Faulted: {}\n", report.fault_count));
    }
    out.push_str(&format!("Average score: {:.3}\n", report.average_score));

    if !report.per_rule_stats.is_empty() {
        out.push_str("\nPer-rule activity:\n");
        for s in &report.per_rule_stats {
            out.push_str(&format!(
                "  - {} [{}] expected={} fired={} fp={} fn={}\n",
                s.rule_id, s.severity, s.expected, s.fired, s.false_positive, s.false_negative
            ));
        }
    }
    out
}
