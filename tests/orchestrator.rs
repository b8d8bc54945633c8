use audit_sweep::checker::{
    CheckResult, Checker, CheckerJob, FatalityPolicy, FixedEntry, Issue, Severity,
};
use audit_sweep::orchestrator::Orchestrator;
use audit_sweep::report::RunState;
use audit_sweep::writer::ReportWriter;
use std::cell::RefCell;
use std::rc::Rc;

/// In-memory checker that replays queued results, recording each invocation.
/// The queue is shared so a second run can observe the "already fixed" state
/// a real fix-mode tool would leave on disk.
struct Scripted {
    name: String,
    policy: FatalityPolicy,
    queue: Rc<RefCell<Vec<CheckResult>>>,
    invocations: Rc<RefCell<Vec<String>>>,
    configured: Option<(Vec<String>, bool)>,
}

impl Scripted {
    fn job(
        name: &str,
        policy: FatalityPolicy,
        results: Vec<CheckResult>,
        invocations: &Rc<RefCell<Vec<String>>>,
    ) -> CheckerJob {
        Self::job_with_queue(name, policy, Rc::new(RefCell::new(results)), invocations)
    }

    fn job_with_queue(
        name: &str,
        policy: FatalityPolicy,
        queue: Rc<RefCell<Vec<CheckResult>>>,
        invocations: &Rc<RefCell<Vec<String>>>,
    ) -> CheckerJob {
        CheckerJob {
            checker: Box::new(Scripted {
                name: name.to_string(),
                policy,
                queue,
                invocations: Rc::clone(invocations),
                configured: None,
            }),
            target_globs: vec!["src/**/*.js".to_string()],
            fix: true,
        }
    }
}

impl Checker for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> FatalityPolicy {
        self.policy
    }

    fn configure(&mut self, target_globs: &[String], fix_mode: bool) {
        self.configured = Some((target_globs.to_vec(), fix_mode));
    }

    fn run(&mut self) -> CheckResult {
        assert!(self.configured.is_some(), "run before configure");
        self.invocations.borrow_mut().push(self.name.clone());
        let mut queue = self.queue.borrow_mut();
        if queue.is_empty() {
            CheckResult::clean(&self.name)
        } else {
            queue.remove(0)
        }
    }
}

fn fixed(location: &str) -> FixedEntry {
    FixedEntry {
        location: location.into(),
    }
}

fn issue(severity: Severity, message: &str) -> Issue {
    Issue {
        location: "src/app.js".into(),
        line: 1,
        column: 1,
        message: message.into(),
        rule: None,
        severity,
    }
}

fn result(name: &str, fixed_entries: Vec<FixedEntry>, issues: Vec<Issue>) -> CheckResult {
    CheckResult {
        checker_name: name.into(),
        fixed_entries,
        issues,
        tool_failed: false,
        raw_output: None,
    }
}

#[test]
fn zero_checkers_complete_with_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010000").unwrap();

    let mut orchestrator = Orchestrator::new(Vec::new());
    let out = orchestrator.run(&mut writer).unwrap();

    assert_eq!(out.state, RunState::Completed);
    assert_eq!(orchestrator.state(), RunState::Completed);
    assert!(out.report.results.is_empty());
    assert_eq!(out.total.fixed_count, 0);
    assert_eq!(out.total.error_count, 0);
    assert_eq!(out.total.warning_count, 0);
    assert!(out.report.finished_at.is_some());

    let text = std::fs::read_to_string(dir.path().join("audit_202601010000.txt")).unwrap();
    assert!(text.contains("total: fixed=0 errors=0 warnings=0"));
    assert!(text.contains("state: completed"));
}

#[test]
fn strict_fixes_and_lenient_warning_complete() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    let jobs = vec![
        Scripted::job(
            "strict-linter",
            FatalityPolicy::Strict,
            vec![result(
                "strict-linter",
                vec![fixed("src/a.js"), fixed("src/b.js")],
                vec![],
            )],
            &invocations,
        ),
        Scripted::job(
            "style-checker",
            FatalityPolicy::Lenient,
            vec![result(
                "style-checker",
                vec![],
                vec![issue(Severity::Warning, "line too long")],
            )],
            &invocations,
        ),
    ];

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010001").unwrap();
    let mut orchestrator = Orchestrator::new(jobs);
    let out = orchestrator.run(&mut writer).unwrap();

    assert_eq!(out.state, RunState::Completed);
    assert!(out.report.fatal_checker.is_none());
    assert_eq!(out.total.fixed_count, 2);
    assert_eq!(out.total.error_count, 0);
    assert_eq!(out.total.warning_count, 1);
    assert_eq!(
        *invocations.borrow(),
        vec!["strict-linter".to_string(), "style-checker".to_string()]
    );
}

#[test]
fn strict_error_is_fatal_and_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    let jobs = vec![
        Scripted::job("a", FatalityPolicy::Lenient, vec![], &invocations),
        Scripted::job(
            "b",
            FatalityPolicy::Strict,
            vec![result(
                "b",
                vec![],
                vec![issue(Severity::Error, "unresolved")],
            )],
            &invocations,
        ),
        Scripted::job("c", FatalityPolicy::Lenient, vec![], &invocations),
    ];

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010002").unwrap();
    let mut orchestrator = Orchestrator::new(jobs);
    let out = orchestrator.run(&mut writer).unwrap();

    assert_eq!(out.state, RunState::Failed);
    assert_eq!(out.report.fatal_checker.as_deref(), Some("b"));
    assert_eq!(out.report.results.len(), 2);
    assert_eq!(*invocations.borrow(), vec!["a".to_string(), "b".to_string()]);

    let text = std::fs::read_to_string(dir.path().join("audit_202601010002.txt")).unwrap();
    assert!(text.contains("== a =="));
    assert!(text.contains("== b =="));
    assert!(!text.contains("== c =="));
    assert!(text.contains("state: failed (fatal checker: b)"));
}

#[test]
fn lenient_errors_do_not_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    let jobs = vec![
        Scripted::job(
            "relaxed",
            FatalityPolicy::Lenient,
            vec![result(
                "relaxed",
                vec![],
                vec![issue(Severity::Error, "noted but tolerated")],
            )],
            &invocations,
        ),
        Scripted::job("after", FatalityPolicy::Lenient, vec![], &invocations),
    ];

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010003").unwrap();
    let mut orchestrator = Orchestrator::new(jobs);
    let out = orchestrator.run(&mut writer).unwrap();

    assert_eq!(out.state, RunState::Completed);
    assert_eq!(out.total.error_count, 1);
    assert_eq!(invocations.borrow().len(), 2);
}

#[test]
fn tool_failure_is_fatal_even_for_lenient_checkers() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    let jobs = vec![
        Scripted::job(
            "flaky",
            FatalityPolicy::Lenient,
            vec![CheckResult::tool_failure("flaky", "spawn failed: no such binary")],
            &invocations,
        ),
        Scripted::job("never", FatalityPolicy::Lenient, vec![], &invocations),
    ];

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010004").unwrap();
    let mut orchestrator = Orchestrator::new(jobs);
    let out = orchestrator.run(&mut writer).unwrap();

    assert_eq!(out.state, RunState::Failed);
    assert_eq!(out.report.fatal_checker.as_deref(), Some("flaky"));
    assert_eq!(*invocations.borrow(), vec!["flaky".to_string()]);

    let text = std::fs::read_to_string(dir.path().join("audit_202601010004.txt")).unwrap();
    assert!(text.contains("flaky: tool failed"));
    assert!(text.contains("spawn failed: no such binary"));
}

#[test]
fn section_headers_follow_configured_order() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    let jobs = vec![
        Scripted::job("alpha", FatalityPolicy::Lenient, vec![], &invocations),
        Scripted::job("beta", FatalityPolicy::Lenient, vec![], &invocations),
        Scripted::job("gamma", FatalityPolicy::Lenient, vec![], &invocations),
    ];

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010005").unwrap();
    let mut orchestrator = Orchestrator::new(jobs);
    let out = orchestrator.run(&mut writer).unwrap();
    assert_eq!(out.state, RunState::Completed);

    let text = std::fs::read_to_string(dir.path().join("audit_202601010005.txt")).unwrap();
    let alpha = text.find("== alpha ==").unwrap();
    let beta = text.find("== beta ==").unwrap();
    let gamma = text.find("== gamma ==").unwrap();
    assert!(alpha < beta);
    assert!(beta < gamma);
}

#[test]
fn second_fix_run_reports_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    // First run fixes two files; the queue then only yields clean results,
    // mirroring a tool whose fixes already landed on disk.
    let queue = Rc::new(RefCell::new(vec![result(
        "strict-linter",
        vec![fixed("src/a.js"), fixed("src/b.js")],
        vec![],
    )]));

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010006").unwrap();
    let mut first = Orchestrator::new(vec![Scripted::job_with_queue(
        "strict-linter",
        FatalityPolicy::Strict,
        Rc::clone(&queue),
        &invocations,
    )]);
    let out = first.run(&mut writer).unwrap();
    assert_eq!(out.state, RunState::Completed);
    assert_eq!(out.total.fixed_count, 2);

    let mut writer = ReportWriter::new(dir.path());
    writer.initialize("202601010007").unwrap();
    let mut second = Orchestrator::new(vec![Scripted::job_with_queue(
        "strict-linter",
        FatalityPolicy::Strict,
        Rc::clone(&queue),
        &invocations,
    )]);
    let out = second.run(&mut writer).unwrap();
    assert_eq!(out.state, RunState::Completed);
    assert_eq!(out.total.fixed_count, 0);
    assert_eq!(out.total.error_count, 0);
}

#[test]
fn uninitialized_writer_surfaces_report_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let invocations = Rc::new(RefCell::new(Vec::new()));
    let jobs = vec![Scripted::job(
        "a",
        FatalityPolicy::Lenient,
        vec![],
        &invocations,
    )];

    // initialize never called, so the first write must abort the run.
    let mut writer = ReportWriter::new(dir.path());
    let mut orchestrator = Orchestrator::new(jobs);
    assert!(orchestrator.run(&mut writer).is_err());
    assert_eq!(orchestrator.state(), RunState::Failed);
}
