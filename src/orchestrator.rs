use crate::{
    aggregate::{self, Summary},
    checker::{CheckResult, CheckerJob, FatalityPolicy},
    report::{AuditReport, RunState},
    util::now_rfc3339,
    writer::ReportWriter,
};
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{info, warn};

pub struct Orchestrator {
    jobs: Vec<CheckerJob>,
    state: RunState,
}

pub struct RunOutput {
    pub report: AuditReport,
    pub state: RunState,
    pub total: Summary,
}

impl Orchestrator {
    pub fn new(jobs: Vec<CheckerJob>) -> Self {
        Self {
            jobs,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drives every configured checker in order and persists the report as it
    /// grows. The only error that crosses this boundary is a failure to write
    /// the durable artifact; checker trouble is folded into the report.
    pub fn run(&mut self, writer: &mut ReportWriter) -> Result<RunOutput> {
        let mut report = AuditReport::begin();
        self.state = RunState::Running;

        match self.drive(&mut report, writer) {
            Ok(state) => {
                self.state = state;
                let total = aggregate::total(&report);
                Ok(RunOutput {
                    report,
                    state,
                    total,
                })
            }
            Err(err) => {
                self.state = RunState::Failed;
                if report.finished_at.is_none() {
                    report.finished_at = Some(now_rfc3339());
                }
                console_dump(&report);
                Err(err).context("writing audit artifact")
            }
        }
    }

    fn drive(&mut self, report: &mut AuditReport, writer: &mut ReportWriter) -> Result<RunState> {
        for job in &mut self.jobs {
            let name = job.checker.name().to_string();
            info!(
                "checker {name} starting fix={} globs={:?}",
                job.fix, job.target_globs
            );
            job.checker.configure(&job.target_globs, job.fix);

            let t0 = Instant::now();
            let result = job.checker.run();
            info!("checker {name} finished in {:?}", t0.elapsed());

            let summary = aggregate::summarize(&result);
            let fatal = result.tool_failed
                || (job.checker.policy() == FatalityPolicy::Strict && summary.error_count > 0);

            aggregate::merge(report, result);
            if let Some(merged) = report.results.last() {
                write_section(writer, merged, &summary)?;
            }

            if fatal {
                warn!("checker {name} is fatal; stopping the run");
                report.fatal_checker = Some(name);
                break;
            }
        }

        report.finished_at = Some(now_rfc3339());
        let state = if report.fatal_checker.is_some() {
            RunState::Failed
        } else {
            RunState::Completed
        };

        write_final(writer, report, state)?;
        writer.finish()?;
        Ok(state)
    }
}

fn write_section(writer: &mut ReportWriter, result: &CheckResult, summary: &Summary) -> Result<()> {
    writer.write_line(&format!("== {} ==", result.checker_name))?;
    for fixed in &result.fixed_entries {
        writer.write_line(&format!("fixed {}", fixed.location))?;
    }
    for issue in &result.issues {
        writer.write_line(&format!(
            "{}:{}:{} {} {} {}",
            issue.location,
            issue.line,
            issue.column,
            issue.severity.label(),
            issue.rule.as_deref().unwrap_or("-"),
            issue.message
        ))?;
    }
    if result.tool_failed {
        writer.write_line(&format!("{}: tool failed", result.checker_name))?;
    }
    if let Some(raw) = result.raw_output.as_deref() {
        for line in raw.lines() {
            writer.write_line(&format!("  {line}"))?;
        }
    }
    writer.write_line(&format!(
        "{}: fixed={} errors={} warnings={}",
        result.checker_name, summary.fixed_count, summary.error_count, summary.warning_count
    ))?;
    Ok(())
}

fn write_final(writer: &mut ReportWriter, report: &AuditReport, state: RunState) -> Result<()> {
    let total = aggregate::total(report);
    for result in &report.results {
        for fixed in &result.fixed_entries {
            writer.write_line(&format!("fixed {} ({})", fixed.location, result.checker_name))?;
        }
    }
    writer.write_line(&format!(
        "total: fixed={} errors={} warnings={}",
        total.fixed_count, total.error_count, total.warning_count
    ))?;
    match state {
        RunState::Failed => {
            let name = report.fatal_checker.as_deref().unwrap_or("unknown");
            writer.write_line(&format!("state: failed (fatal checker: {name})"))?;
        }
        _ => writer.write_line("state: completed")?,
    }
    Ok(())
}

/// Best-effort console record when the durable artifact itself cannot be
/// written; the report still reflects everything aggregated so far.
fn console_dump(report: &AuditReport) {
    let total = aggregate::total(report);
    eprintln!("audit artifact could not be written; results aggregated so far:");
    for result in &report.results {
        let s = aggregate::summarize(result);
        eprintln!(
            "  {}: fixed={} errors={} warnings={}",
            result.checker_name, s.fixed_count, s.error_count, s.warning_count
        );
    }
    eprintln!(
        "  total: fixed={} errors={} warnings={}",
        total.fixed_count, total.error_count, total.warning_count
    );
}
