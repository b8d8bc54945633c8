use crate::checker::FatalityPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default, rename = "checker")]
    pub checkers: Vec<CheckerSpec>,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: Default::default(),
            paths: Default::default(),
            checkers: Vec::new(),
            output: Default::default(),
            logging: Default::default(),
            debug: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub report_dir: String,
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            report_dir: "audit-reports".into(),
            work_dir: ".audit-sweep-work".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerKind {
    Json,
    Plain,
}

/// One external analysis tool wrapped for the run. Everything the tool needs
/// is carried here so results are reproducible across machines; nothing is
/// picked up from the ambient environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerSpec {
    pub name: String,
    pub command: Vec<String>,
    pub kind: CheckerKind,
    pub policy: FatalityPolicy,
    pub target_globs: Vec<String>,
    pub fix: bool,
    pub timeout_seconds: u64,
    pub config_file_arg: Option<String>,
    pub fix_flag: String,
    pub fixed_prefix: String,
    pub version_arg: String,
    // Tables last; TOML cannot emit values after a table header.
    pub env: BTreeMap<String, String>,
    pub config: serde_json::Map<String, serde_json::Value>,
}
impl Default for CheckerSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            command: Vec::new(),
            kind: CheckerKind::Plain,
            policy: FatalityPolicy::Lenient,
            target_globs: Vec::new(),
            fix: false,
            timeout_seconds: 600,
            config_file_arg: None,
            fix_flag: "--fix".into(),
            fixed_prefix: "fixed ".into(),
            version_arg: "--version".into(),
            env: Default::default(),
            config: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_report_json: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_report_json: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub keep_checker_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_checker_stderr: true,
            dump_effective_config: true,
        }
    }
}
