use super::process::{self, TempConfigFile};
use super::types::{CheckResult, CheckerDiag, FixedEntry, Issue, Severity};
use super::{Checker, FatalityPolicy, RunPlan};
use crate::config::CheckerSpec;
use anyhow::Result;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Adapter for conventional lint tools that print
/// `location:line:col: severity: message [rule]` findings and
/// `fixed <path>` lines. Globs and the fix flag travel as argv; output that
/// matches neither shape is preserved verbatim for display.
pub struct PlainChecker {
    spec: CheckerSpec,
    work_dir: PathBuf,
    keep_stderr: bool,
    line_re: Regex,
    plan: Option<RunPlan>,
}

impl PlainChecker {
    pub fn new(spec: CheckerSpec, work_dir: PathBuf, keep_stderr: bool) -> Result<Self> {
        let line_re = Regex::new(
            r"^(?P<loc>[^:\s][^:]*):(?P<line>\d+):(?P<col>\d+):?\s+(?P<sev>error|warning)\s*:?\s+(?P<msg>.+)$",
        )?;
        Ok(Self {
            spec,
            work_dir,
            keep_stderr,
            line_re,
            plan: None,
        })
    }

    pub fn parse_output(&self, stdout: &str) -> (Vec<FixedEntry>, Vec<Issue>) {
        let mut fixed = Vec::new();
        let mut issues = Vec::new();

        for line in stdout.lines() {
            let line = line.trim_end();
            if let Some(location) = line.strip_prefix(self.spec.fixed_prefix.as_str()) {
                let location = location.trim();
                if !location.is_empty() {
                    fixed.push(FixedEntry {
                        location: location.to_string(),
                    });
                    continue;
                }
            }
            if let Some(caps) = self.line_re.captures(line) {
                let severity = match &caps["sev"] {
                    "error" => Severity::Error,
                    _ => Severity::Warning,
                };
                let (message, rule) = split_rule(caps["msg"].trim());
                issues.push(Issue {
                    location: caps["loc"].to_string(),
                    line: caps["line"].parse().unwrap_or(0),
                    column: caps["col"].parse().unwrap_or(0),
                    message,
                    rule,
                    severity,
                });
            }
        }

        (fixed, issues)
    }
}

fn split_rule(msg: &str) -> (String, Option<String>) {
    if let Some(idx) = msg.rfind(" [") {
        if msg.ends_with(']') {
            let rule = &msg[idx + 2..msg.len() - 1];
            if !rule.is_empty() && !rule.contains(' ') {
                return (msg[..idx].trim_end().to_string(), Some(rule.to_string()));
            }
        }
    }
    (msg.to_string(), None)
}

impl Checker for PlainChecker {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn policy(&self) -> FatalityPolicy {
        self.spec.policy
    }

    fn configure(&mut self, target_globs: &[String], fix_mode: bool) {
        self.plan = Some(RunPlan {
            globs: target_globs.to_vec(),
            fix: fix_mode,
        });
    }

    fn run(&mut self) -> CheckResult {
        let name = self.spec.name.clone();
        let Some(plan) = self.plan.clone() else {
            return CheckResult::tool_failure(&name, "run() called before configure()");
        };

        let mut argv = self.spec.command.clone();
        if plan.fix && !self.spec.fix_flag.is_empty() {
            argv.push(self.spec.fix_flag.clone());
        }
        let _config = match &self.spec.config_file_arg {
            Some(flag) => match TempConfigFile::create(&self.work_dir, &name, &self.spec.config) {
                Ok(file) => {
                    argv.push(flag.clone());
                    argv.push(file.path().display().to_string());
                    Some(file)
                }
                Err(err) => return CheckResult::tool_failure(&name, format!("{err:#}")),
            },
            None => None,
        };
        argv.extend(plan.globs.iter().cloned());

        let output =
            match process::run_command(&argv, &self.spec.env, None, self.spec.timeout_seconds) {
                Ok(output) => output,
                Err(err) => {
                    warn!("checker {name} could not run: {err:#}");
                    return CheckResult::tool_failure(&name, format!("{err:#}"));
                }
            };

        if self.keep_stderr && !output.stderr.is_empty() {
            debug!(
                "checker {name} stderr: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (fixed_entries, issues) = self.parse_output(&stdout);

        if issues.is_empty() && fixed_entries.is_empty() && !output.status.success() {
            warn!(
                "checker {name} exited with {} and no parseable findings",
                output.status
            );
            return CheckResult::tool_failure(&name, process::combined_output(&output));
        }

        let raw_output = if issues.is_empty() && fixed_entries.is_empty() && !stdout.trim().is_empty()
        {
            Some(stdout.trim_end().to_string())
        } else {
            None
        };

        CheckResult {
            checker_name: name,
            fixed_entries,
            issues,
            tool_failed: false,
            raw_output,
        }
    }

    fn doctor(&self) -> CheckerDiag {
        process::probe_version(&self.spec)
    }
}
