//! score-worker: periodic scoring and alerting over a snapshot file.
//!
//! Each tick reads a JSON array of asset snapshots, scores them in parallel,
//! runs the threshold monitor and prints composite scores and alert
//! candidates as JSON lines on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};

use pulse_compute::{build_pool, AssetSnapshot, CompositeScore, ScorePipeline};
use pulse_core::config::{load_dotenv, Config};
use pulse_rules::config::LoadStatus;
use pulse_rules::{AlertCandidate, ConfigLoader};

// ── CLI ─────────────────────────────────────────────────────────────

/// Score assets from a snapshot file and emit alert candidates.
#[derive(Parser, Debug)]
#[command(name = "score-worker", version, about)]
struct Cli {
    /// JSON file holding an array of asset snapshots.
    #[arg(long, env = "PULSE_INPUT")]
    input: PathBuf,

    /// Directory of ScoringConfig / ThresholdConfig documents
    /// (overrides PULSE_RULES_DIR).
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Seconds between ticks (overrides PULSE_TICK_SECONDS).
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Rayon worker threads, 0 for available parallelism
    /// (overrides PULSE_WORKER_THREADS).
    #[arg(long)]
    threads: Option<usize>,

    /// Run a single tick and exit.
    #[arg(long)]
    once: bool,
}

/// One line of stdout output.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputLine<'a> {
    Score(&'a CompositeScore),
    Alert(&'a AlertCandidate),
}

fn emit(line: &OutputLine<'_>) {
    match serde_json::to_string(line) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "failed to serialize output line"),
    }
}

fn read_snapshots(path: &Path) -> anyhow::Result<Vec<AssetSnapshot>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshots from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing snapshots in {}", path.display()))
}

/// Minutes since the snapshot file was last written.
fn input_age_minutes(path: &Path, now: DateTime<Utc>) -> Option<f64> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let modified: DateTime<Utc> = modified.into();
    Some((now - modified).num_seconds().max(0) as f64 / 60.0)
}

fn run_tick(pipeline: &mut ScorePipeline, pool: &rayon::ThreadPool, input: &Path) {
    let now = Utc::now();
    let component = "snapshot-input";

    let snapshots = match read_snapshots(input) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "tick skipped");
            let message = format!("{:#}", e);
            if let Some(alert) = pipeline.monitor().report_system_error(component, &message, now) {
                emit(&OutputLine::Alert(&alert));
            }
            return;
        }
    };

    if let Some(age) = input_age_minutes(input, now) {
        if let Some(alert) = pipeline.monitor().check_data_delay(component, age.floor(), now) {
            emit(&OutputLine::Alert(&alert));
        }
    }

    let report = pool.install(|| pipeline.run_tick(&snapshots, now));
    for score in &report.scores {
        emit(&OutputLine::Score(score));
    }
    for alert in &report.alerts {
        emit(&OutputLine::Alert(alert));
    }
}

// ── Main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let rules_dir = cli.rules_dir.clone().unwrap_or_else(|| config.engine.rules_dir.clone());
    let docs = ConfigLoader::new(&rules_dir)
        .load()
        .with_context(|| format!("loading engine documents from {}", rules_dir.display()))?;
    for result in &docs.results {
        match &result.status {
            LoadStatus::Loaded { id, kind } => {
                info!(path = %result.path.display(), id = %id, kind = %kind, "document loaded")
            }
            LoadStatus::Skipped { reason } => {
                info!(path = %result.path.display(), reason = %reason, "document skipped")
            }
            LoadStatus::Failed { error } => {
                warn!(path = %result.path.display(), error = %error, "document rejected")
            }
        }
    }

    let threads = cli.threads.unwrap_or(config.worker.threads);
    let pool = build_pool(threads).context("building scoring thread pool")?;
    let mut pipeline = ScorePipeline::from_documents(&docs);

    info!(
        input = %cli.input.display(),
        threads = pool.current_num_threads(),
        "score-worker started"
    );

    if cli.once {
        run_tick(&mut pipeline, &pool, &cli.input);
        return Ok(());
    }

    let interval_secs = cli.interval_secs.unwrap_or(config.worker.tick_seconds).max(1);
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => run_tick(&mut pipeline, &pool, &cli.input),
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    let stats = pipeline.monitor().stats(Utc::now());
    info!(
        ticks = pipeline.metrics.ticks,
        assets = pipeline.metrics.assets_scored,
        alerts = stats.alert_count,
        checks = stats.check_count,
        "score-worker stopped"
    );
    Ok(())
}
