use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Targets the engine and the runner emit under.
const DECISION_TARGET: &str = "mexico_bot::decision";
const OBSERVE_TARGET: &str = "mexico_bot::observe";
const STATE_TARGET: &str = "mexico_bot::state";
const ROUND_TARGET: &str = "mexico_bench::round";

pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Filter used when `RUST_LOG` is unset.
///
/// Other crates are held at `warn` so the telemetry file carries decisions and
/// rounds only. Belief updates are logged at `debug` and are switched on by
/// `observe_details` regardless of the configured level.
pub fn default_directives(logging: &LoggingConfig) -> String {
    let level = logging.level().unwrap_or(Level::INFO);
    let observe = if logging.observe_details {
        Level::DEBUG
    } else {
        level
    };
    format!(
        "warn,{DECISION_TARGET}={level},{ROUND_TARGET}={level},{STATE_TARGET}={level},{OBSERVE_TARGET}={observe}"
    )
}

fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("telemetry.jsonl")
}

/// Routes engine and round events as JSON lines into `telemetry.jsonl`,
/// next to the summary table.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_path = telemetry_path(outputs);
    if let Some(dir) = telemetry_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(logging)));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_target(true)
        .with_writer(writer)
        .finish();

    // Integration tests share one process; the first subscriber wins.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}
