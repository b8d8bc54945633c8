use crate::checker::{CheckResult, Severity};
use crate::report::AuditReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub fixed_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

pub fn summarize(result: &CheckResult) -> Summary {
    let mut summary = Summary {
        fixed_count: result.fixed_entries.len(),
        ..Default::default()
    };
    for issue in &result.issues {
        match issue.severity {
            Severity::Error => summary.error_count += 1,
            Severity::Warning => summary.warning_count += 1,
        }
    }
    summary
}

/// Appends in execution order. No deduplication: a checker may legitimately
/// report the same location twice under different rules.
pub fn merge(report: &mut AuditReport, result: CheckResult) {
    report.results.push(result);
}

pub fn total(report: &AuditReport) -> Summary {
    let mut total = Summary::default();
    for result in &report.results {
        let s = summarize(result);
        total.fixed_count += s.fixed_count;
        total.error_count += s.error_count;
        total.warning_count += s.warning_count;
    }
    total
}
