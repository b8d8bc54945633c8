use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedEntry {
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub location: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
    #[serde(default)]
    pub rule: Option<String>,
    pub severity: Severity,
}

/// Outcome of running one checker once. Tool trouble is carried here as data;
/// adapters never surface it as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub checker_name: String,
    #[serde(default)]
    pub fixed_entries: Vec<FixedEntry>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub tool_failed: bool,
    #[serde(default)]
    pub raw_output: Option<String>,
}

impl CheckResult {
    pub fn clean(checker_name: &str) -> Self {
        Self {
            checker_name: checker_name.to_string(),
            fixed_entries: Vec::new(),
            issues: Vec::new(),
            tool_failed: false,
            raw_output: None,
        }
    }

    pub fn tool_failure(checker_name: &str, detail: impl Into<String>) -> Self {
        Self {
            checker_name: checker_name.to_string(),
            fixed_entries: Vec::new(),
            issues: Vec::new(),
            tool_failed: true,
            raw_output: Some(detail.into()),
        }
    }
}

/// Request payload handed to a JSON-protocol checker on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub globs: Vec<String>,
    pub fix: bool,
    pub config: serde_json::Value,
}

/// Findings emitted by a JSON-protocol checker on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingsOut {
    #[serde(default)]
    pub fixed: Vec<FixedEntry>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerDiag {
    pub name: String,
    pub command: String,
    pub ok: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
