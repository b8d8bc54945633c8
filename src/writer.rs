use crate::util::ensure_dir;
use anyhow::{Context, Result, anyhow};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

struct Artifact {
    path: PathBuf,
    out: BufWriter<File>,
}

/// Writes the report to a durable per-run artifact while mirroring each line
/// to the live console. Lines are flushed as they are written so the artifact
/// stays truthful even if the run dies mid-way.
pub struct ReportWriter {
    report_dir: PathBuf,
    artifact: Option<Artifact>,
}

impl ReportWriter {
    pub fn new(report_dir: &Path) -> Self {
        Self {
            report_dir: report_dir.to_path_buf(),
            artifact: None,
        }
    }

    /// Opens the per-run artifact `audit_<stamp>.txt`. Called once per run,
    /// before any `write_line`.
    pub fn initialize(&mut self, run_stamp: &str) -> Result<PathBuf> {
        ensure_dir(&self.report_dir)?;
        let path = self.report_dir.join(format!("audit_{run_stamp}.txt"));
        let file = File::create(&path)
            .with_context(|| format!("creating audit artifact: {}", path.display()))?;
        self.artifact = Some(Artifact {
            path: path.clone(),
            out: BufWriter::new(file),
        });
        Ok(path)
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(|a| a.path.as_path())
    }

    pub fn write_line(&mut self, text: &str) -> Result<()> {
        println!("{text}");
        let artifact = self
            .artifact
            .as_mut()
            .ok_or_else(|| anyhow!("report writer used before initialize"))?;
        writeln!(artifact.out, "{text}")
            .with_context(|| format!("appending to {}", artifact.path.display()))?;
        artifact
            .out
            .flush()
            .with_context(|| format!("flushing {}", artifact.path.display()))?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        if let Some(artifact) = self.artifact.as_mut() {
            artifact
                .out
                .flush()
                .with_context(|| format!("flushing {}", artifact.path.display()))?;
        }
        self.artifact = None;
        Ok(())
    }
}

impl Drop for ReportWriter {
    fn drop(&mut self) {
        if let Some(artifact) = self.artifact.as_mut() {
            let _ = artifact.out.flush();
        }
    }
}
