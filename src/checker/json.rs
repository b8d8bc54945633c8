use super::process::{self, TempConfigFile};
use super::types::{CheckRequest, CheckResult, CheckerDiag, FindingsOut};
use super::{Checker, FatalityPolicy, RunPlan};
use crate::config::CheckerSpec;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Adapter for tools speaking the JSON check protocol: request on stdin,
/// findings on stdout. A non-zero exit with parseable findings is an ordinary
/// findings outcome, not a tool failure (lint tools exit 1 on findings).
pub struct JsonChecker {
    spec: CheckerSpec,
    work_dir: PathBuf,
    keep_stderr: bool,
    plan: Option<RunPlan>,
}

impl JsonChecker {
    pub fn new(spec: CheckerSpec, work_dir: PathBuf, keep_stderr: bool) -> Self {
        Self {
            spec,
            work_dir,
            keep_stderr,
            plan: None,
        }
    }
}

impl Checker for JsonChecker {
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
        let Some(plan) = self.plan.as_ref() else {
            return CheckResult::tool_failure(&name, "run() called before configure()");
        };

        let request = CheckRequest {
            globs: plan.globs.clone(),
            fix: plan.fix,
            config: serde_json::Value::Object(self.spec.config.clone()),
        };
        let payload = match serde_json::to_vec(&request) {
            Ok(bytes) => bytes,
            Err(err) => {
                return CheckResult::tool_failure(&name, format!("encode request: {err}"));
            }
        };

        let mut argv = self.spec.command.clone();
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

        let output = match process::run_command(
            &argv,
            &self.spec.env,
            Some(&payload),
            self.spec.timeout_seconds,
        ) {
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

        match serde_json::from_slice::<FindingsOut>(&output.stdout) {
            Ok(findings) => CheckResult {
                checker_name: name,
                fixed_entries: findings.fixed,
                issues: findings.issues,
                tool_failed: false,
                raw_output: None,
            },
            Err(err) => {
                warn!("checker {name} emitted unparseable findings: {err}");
                CheckResult::tool_failure(&name, process::combined_output(&output))
            }
        }
    }

    fn doctor(&self) -> CheckerDiag {
        process::probe_version(&self.spec)
    }
}
