use super::types::CheckerDiag;
use crate::config::CheckerSpec;
use crate::util::ensure_dir;
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub fn run_command(
    argv: &[String],
    env: &BTreeMap<String, String>,
    stdin_payload: Option<&[u8]>,
    timeout_seconds: u64,
) -> Result<Output> {
    let exe = argv.first().ok_or_else(|| anyhow!("empty checker command"))?;
    debug!("spawn {:?} timeout={}s", argv, timeout_seconds);

    let mut cmd = Command::new(exe);
    cmd.args(&argv[1..]);
    cmd.stdin(if stdin_payload.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning checker: {exe}"))?;

    if let Some(payload) = stdin_payload {
        let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin"))?;
        use std::io::Write;
        stdin.write_all(payload)?;
        stdin.flush().ok();
    }

    if timeout_seconds > 0 {
        wait_with_timeout(&mut child, Duration::from_secs(timeout_seconds))
    } else {
        child
            .wait_with_output()
            .with_context(|| "waiting for checker")
    }
}

/// stdout and stderr merged, for preserving unparsed tool output.
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    text
}

/// On-disk config payload for a single invocation. Removed on drop so no
/// stale tool config leaks into the next run.
pub struct TempConfigFile {
    path: PathBuf,
}

impl TempConfigFile {
    pub fn create(
        work_dir: &Path,
        checker_name: &str,
        payload: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        ensure_dir(work_dir)?;
        let path = work_dir.join(format!("{checker_name}-config.json"));
        let bytes = serde_json::to_vec_pretty(&serde_json::Value::Object(payload.clone()))?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("writing checker config: {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempConfigFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub fn probe_version(spec: &CheckerSpec) -> CheckerDiag {
    let mut argv = spec.command.clone();
    if !spec.version_arg.is_empty() {
        argv.push(spec.version_arg.clone());
    }
    let command = argv.first().cloned().unwrap_or_default();

    match run_command(&argv, &spec.env, None, 30) {
        Ok(output) => {
            let version = combined_output(&output)
                .lines()
                .next()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty());
            if output.status.success() {
                CheckerDiag {
                    name: spec.name.clone(),
                    command,
                    ok: true,
                    version,
                    error: None,
                }
            } else {
                CheckerDiag {
                    name: spec.name.clone(),
                    command,
                    ok: false,
                    version,
                    error: Some(format!("exited with {}", output.status)),
                }
            }
        }
        Err(err) => CheckerDiag {
            name: spec.name.clone(),
            command,
            ok: false,
            version: None,
            error: Some(format!("{err:#}")),
        },
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty tool can't deadlock the child
    // on a full stdout/stderr buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("checker process timed out after {:?}", timeout);
            let _ = child.kill();
            let _ = child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Err(anyhow!(
                "checker process exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
