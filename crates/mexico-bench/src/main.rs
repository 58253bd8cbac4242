use std::path::PathBuf;

use clap::Parser;

use mexico_bench::config::{BenchmarkConfig, ResolvedOutputs};
use mexico_bench::logging::init_logging;
use mexico_bench::tournament::{TournamentRunner, load_engine_state};

/// Simulated heads-up series against scripted Mexico opponents.
#[derive(Debug, Parser)]
#[command(
    name = "mexico-bench",
    author,
    version,
    about = "Deterministic Mexico engine benchmark"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of rounds to play.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<usize>,

    /// Override the RNG seed for dice and engine.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Start the engine from a saved state file instead of from priors.
    #[arg(long, value_name = "STATE_JSON")]
    resume: Option<PathBuf>,

    /// Write structured telemetry and include belief and bandit updates.
    #[arg(long)]
    log_observe_details: bool,

    /// Exit after validating the configuration (no rounds are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(rounds) = cli.rounds {
        config.rounds.count = rounds;
    }

    if let Some(seed) = cli.seed {
        config.rounds.seed = Some(seed);
    }

    if cli.log_observe_details {
        config.logging.enable_structured = true;
        config.logging.observe_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let opponent_count = config.opponents.len();
    let run_id = config.run_id.clone();
    let rounds = config.rounds.count;

    println!(
        "Loaded configuration '{run_id}' with {opponent_count} opponent{} ({rounds} rounds)",
        if opponent_count == 1 { "" } else { "s" }
    );

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let mut runner = TournamentRunner::new(config, outputs)?;
    if let Some(path) = cli.resume.as_ref() {
        runner = runner.with_state(load_engine_state(path)?);
        println!("Resuming engine state from {}", path.display());
    }

    if cli.validate_only {
        println!("Validation-only mode: no rounds played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Series complete for '{run_id}': engine won {} of {} rounds ({:.1}%), {} rows at {}",
        summary.engine_wins,
        summary.rounds_played,
        summary.analytics.total.win_rate * 100.0,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    println!("Engine state: {}", summary.state_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
