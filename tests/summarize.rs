use audit_sweep::aggregate::{Summary, merge, summarize, total};
use audit_sweep::checker::{CheckResult, FixedEntry, Issue, Severity};
use audit_sweep::report::AuditReport;

fn issue(severity: Severity) -> Issue {
    Issue {
        location: "src/app.js".into(),
        line: 3,
        column: 7,
        message: "something is off".into(),
        rule: Some("no-unused-vars".into()),
        severity,
    }
}

fn result(name: &str, fixed: usize, errors: usize, warnings: usize) -> CheckResult {
    CheckResult {
        checker_name: name.into(),
        fixed_entries: (0..fixed)
            .map(|i| FixedEntry {
                location: format!("src/f{i}.js"),
            })
            .collect(),
        issues: (0..errors)
            .map(|_| issue(Severity::Error))
            .chain((0..warnings).map(|_| issue(Severity::Warning)))
            .collect(),
        tool_failed: false,
        raw_output: None,
    }
}

#[test]
fn counts_by_severity() {
    let s = summarize(&result("linter", 2, 3, 4));
    assert_eq!(
        s,
        Summary {
            fixed_count: 2,
            error_count: 3,
            warning_count: 4,
        }
    );
}

#[test]
fn empty_result_is_all_zero() {
    let s = summarize(&CheckResult::clean("linter"));
    assert_eq!(s, Summary::default());
}

#[test]
fn duplicate_locations_are_kept() {
    let mut r = result("linter", 0, 1, 0);
    let mut again = issue(Severity::Error);
    again.rule = Some("eqeqeq".into());
    r.issues.push(again);
    assert_eq!(summarize(&r).error_count, 2);
}

#[test]
fn totals_accumulate_across_results() {
    let mut report = AuditReport::begin();
    merge(&mut report, result("a", 1, 0, 2));
    merge(&mut report, result("b", 0, 3, 1));

    let t = total(&report);
    assert_eq!(
        t,
        Summary {
            fixed_count: 1,
            error_count: 3,
            warning_count: 3,
        }
    );
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].checker_name, "a");
    assert_eq!(report.results[1].checker_name, "b");
}
