use crate::{
    aggregate,
    checker,
    config::Config,
    orchestrator::Orchestrator,
    report::RunState,
    util::{ensure_dir, now_rfc3339, run_stamp, sha256_hex},
    writer::ReportWriter,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "audit-sweep")]
#[command(about = "Code-quality audit orchestrator (checker sequencing + merged reports)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./audit-sweep.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Doctor {},
    Plan {},
    Run {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Doctor {} => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            doctor(&cfg)
        }
        Command::Plan {} => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            plan(&cfg)
        }
        Command::Run { out_dir } => run(&args, &cfg, out_dir.as_deref()),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("audit-sweep.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("audit-sweep.example.toml"))
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config, report_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    if let Some(report_dir) = report_dir {
        return Some(report_dir.join("audit-sweep.log"));
    }

    Some(PathBuf::from(&cfg.paths.report_dir).join("audit-sweep.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let jobs = checker::jobs_from_config(cfg)?;
    let diags: Vec<_> = jobs.iter().map(|job| job.checker.doctor()).collect();
    println!("{}", serde_json::to_string_pretty(&diags)?);
    if diags.iter().any(|d| !d.ok) {
        return Err(anyhow!("one or more checkers are not invokable"));
    }
    Ok(())
}

fn plan(cfg: &Config) -> Result<()> {
    checker::validate_specs(&cfg.checkers)?;
    let entries: Vec<_> = cfg
        .checkers
        .iter()
        .map(|spec| {
            serde_json::json!({
                "name": spec.name,
                "kind": spec.kind,
                "policy": spec.policy,
                "fix": spec.fix,
                "target_globs": spec.target_globs,
                "timeout_seconds": spec.timeout_seconds,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn run(args: &Args, cfg: &Config, out_override: Option<&Path>) -> Result<()> {
    let report_dir = out_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.report_dir));
    ensure_dir(&report_dir)?;
    ensure_dir(Path::new(&cfg.paths.work_dir))?;

    let log_path = resolve_log_path(cfg, Some(&report_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    info!("config sha256={cfg_hash}");

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(report_dir.join("effective-config.toml"), raw)?;
    }

    let stamp = run_stamp();
    let jobs = checker::jobs_from_config(cfg)?;

    let mut writer = ReportWriter::new(&report_dir);
    let artifact = writer.initialize(&stamp)?;

    println!("audit started {}", now_rfc3339());
    println!("artifact {}", artifact.display());

    let mut orchestrator = Orchestrator::new(jobs);
    let out = orchestrator.run(&mut writer)?;

    if cfg.output.write_report_json {
        let doc = serde_json::json!({
            "config_sha256": cfg_hash,
            "state": out.state,
            "totals": out.total,
            "report": out.report,
        });
        let path = report_dir.join(format!("report_{stamp}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&doc)?)
            .with_context(|| format!("write report json: {}", path.display()))?;
    }

    match out.state {
        RunState::Completed => {
            if cfg.global.print_summary {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "state": "completed",
                        "artifact": artifact,
                        "fixed": out.total.fixed_count,
                        "errors": out.total.error_count,
                        "warnings": out.total.warning_count,
                    }))?
                );
            }
            Ok(())
        }
        _ => {
            let name = out
                .report
                .fatal_checker
                .clone()
                .unwrap_or_else(|| "unknown".into());
            let errors = out
                .report
                .results
                .iter()
                .rev()
                .find(|r| r.checker_name == name)
                .map(|r| aggregate::summarize(r).error_count)
                .unwrap_or(0);
            Err(anyhow!(
                "audit failed: fatal checker {name} reported {errors} errors"
            ))
        }
    }
}
