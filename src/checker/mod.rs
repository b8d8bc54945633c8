pub mod json;
pub mod plain;
pub mod process;
pub mod types;

use crate::config::{CheckerKind, CheckerSpec, Config};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub use types::{CheckRequest, CheckResult, CheckerDiag, FindingsOut, FixedEntry, Issue, Severity};

/// Whether a checker's unresolved error-severity findings fail the whole run.
/// Configuration, not a property of any particular tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatalityPolicy {
    Strict,
    Lenient,
}

pub trait Checker {
    fn name(&self) -> &str;
    fn policy(&self) -> FatalityPolicy;
    /// Sets the file selection and fix mode for the next `run`. Must be
    /// called before `run`.
    fn configure(&mut self, target_globs: &[String], fix_mode: bool);
    /// Executes the wrapped tool exactly once. Findings and tool trouble
    /// both come back as data.
    fn run(&mut self) -> CheckResult;
    fn doctor(&self) -> CheckerDiag {
        CheckerDiag {
            name: self.name().to_string(),
            command: String::new(),
            ok: true,
            version: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RunPlan {
    pub globs: Vec<String>,
    pub fix: bool,
}

/// A checker paired with the selection it should be configured with.
pub struct CheckerJob {
    pub checker: Box<dyn Checker>,
    pub target_globs: Vec<String>,
    pub fix: bool,
}

pub fn validate_specs(specs: &[CheckerSpec]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for spec in specs {
        if spec.name.trim().is_empty() {
            return Err(anyhow!("checker with empty name"));
        }
        if spec.command.is_empty() {
            return Err(anyhow!("checker {} has an empty command", spec.name));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(anyhow!("duplicate checker name: {}", spec.name));
        }
    }
    Ok(())
}

pub fn jobs_from_config(cfg: &Config) -> Result<Vec<CheckerJob>> {
    validate_specs(&cfg.checkers)?;
    let work_dir = PathBuf::from(&cfg.paths.work_dir);
    let keep_stderr = cfg.debug.keep_checker_stderr;

    let mut jobs = Vec::new();
    for spec in &cfg.checkers {
        let checker: Box<dyn Checker> = match spec.kind {
            CheckerKind::Json => Box::new(json::JsonChecker::new(
                spec.clone(),
                work_dir.clone(),
                keep_stderr,
            )),
            CheckerKind::Plain => Box::new(plain::PlainChecker::new(
                spec.clone(),
                work_dir.clone(),
                keep_stderr,
            )?),
        };
        jobs.push(CheckerJob {
            checker,
            target_globs: spec.target_globs.clone(),
            fix: spec.fix,
        });
    }
    Ok(jobs)
}
