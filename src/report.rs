use crate::checker::CheckResult;
use crate::util::now_rfc3339;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Merged record of one whole run. `results` grows append-only in execution
/// order and the report is never reused across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub started_at: String,
    pub results: Vec<CheckResult>,
    #[serde(default)]
    pub fatal_checker: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl AuditReport {
    pub fn begin() -> Self {
        Self {
            started_at: now_rfc3339(),
            results: Vec::new(),
            fatal_checker: None,
            finished_at: None,
        }
    }
}
