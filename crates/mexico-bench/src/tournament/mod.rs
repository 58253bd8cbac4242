mod scripted;

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use mexico_bot::{Decision, DecisionEngine, DecisionPath, EngineError, EngineState};
use mexico_core::{Claim, ClaimRules, MexicoRules, Roll};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{BenchmarkConfig, ResolvedOutputs};

pub use scripted::{ScriptedMove, ScriptedOpponent};

/// Every raise climbs the 21-step ladder, so a round ends well before this.
const MAX_TURNS: usize = 64;

/// Primary entry point for playing a simulated series.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    opponents: Vec<ScriptedOpponent>,
    resume: Option<EngineState>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub rounds_played: usize,
    pub rows_written: usize,
    pub engine_wins: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub state_path: PathBuf,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        if config.opponents.is_empty() {
            return Err(RunnerError::NoOpponents);
        }
        let opponents = config
            .opponents
            .iter()
            .map(ScriptedOpponent::from_config)
            .collect();

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            opponents,
            resume: None,
        })
    }

    /// Start the engine from a previously saved state instead of from priors.
    pub fn with_state(mut self, state: EngineState) -> Self {
        self.resume = Some(state);
        self
    }

    /// Play every configured round, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        ensure_parent(self.outputs.state_json.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.rounds.seed.unwrap_or(0));
        let mut engine =
            DecisionEngine::with_seed(self.config.engine, rng.next_u64()).with_rules(MexicoRules);
        if let Some(state) = self.resume.as_ref() {
            engine.load_state(state)?;
        }

        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;
        let mut engine_wins = 0usize;

        for round_index in 0..self.config.rounds.count {
            let opponent = &self.opponents[round_index % self.opponents.len()];
            let outcome = play_round(&mut engine, &MexicoRules, opponent, round_index, &mut rng)?;
            analytics.record_round(&outcome)?;
            if outcome.engine_won {
                engine_wins += 1;
            }

            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                event!(
                    target: "mexico_bench::round",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    round_index = round_index as u64,
                    opponent = %outcome.opponent,
                    starter = outcome.starter.as_str(),
                    turns = outcome.turns.len() as u64,
                    winner = outcome.winner.as_str(),
                );
            }

            write_round_row(&mut writer, &self.config.run_id, &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let state_json = engine.state().to_json()?;
        fs::write(&self.outputs.state_json, state_json)?;

        let analytics = analytics.finalize()?;
        analytics.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            rounds_played: self.config.rounds.count,
            rows_written,
            engine_wins,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            state_path: self.outputs.state_json.clone(),
            analytics,
        })
    }
}

/// Reads an engine state previously written by [`TournamentRunner::run`].
pub fn load_engine_state(path: impl AsRef<Path>) -> Result<EngineState, RunnerError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    EngineState::from_json(&json).map_err(|source| RunnerError::Resume {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Engine,
    Opponent,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Engine => "engine",
            Side::Opponent => "opponent",
        }
    }

    const fn other(self) -> Self {
        match self {
            Side::Engine => Side::Opponent,
            Side::Opponent => Side::Engine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnRecord {
    pub actor: Side,
    /// `None` for a challenge.
    pub claim: Option<Claim>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<DecisionPath>,
}

#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub round_index: usize,
    pub opponent: String,
    pub starter: Side,
    pub turns: Vec<TurnRecord>,
    pub paths: Vec<DecisionPath>,
    pub winner: Side,
    pub engine_won: bool,
}

/// The claim on the table and the roll hidden under it.
#[derive(Clone, Copy)]
struct Standing {
    claim: Claim,
    roll: Roll,
}

/// Plays one heads-up round, feeding every observation back into `engine`.
///
/// The starter alternates with the round index. A raise that does not beat
/// the standing claim counts as a challenge.
pub fn play_round<R: RngCore>(
    engine: &mut DecisionEngine,
    rules: &dyn ClaimRules,
    opponent: &ScriptedOpponent,
    round_index: usize,
    rng: &mut R,
) -> Result<RoundOutcome, RunnerError> {
    let opponent_id = opponent.name();
    let starter = if round_index % 2 == 0 {
        Side::Engine
    } else {
        Side::Opponent
    };
    let engine_round = u32::try_from(round_index).unwrap_or(u32::MAX);
    let mut actor = starter;
    let mut standing: Option<Standing> = None;
    let mut turns = Vec::new();
    let mut paths = Vec::new();

    for _ in 0..MAX_TURNS {
        let roll = Roll::random(rng);
        let current = standing.map(|s| s.claim);

        let raised = match actor {
            Side::Engine => {
                let trace = engine.decide_traced(opponent_id, current, roll, engine_round)?;
                paths.push(trace.path);
                match trace.decision {
                    Decision::Raise(claim) if beats(rules, current, claim) => {
                        turns.push(TurnRecord {
                            actor,
                            claim: Some(claim),
                            path: Some(trace.path),
                        });
                        Some(claim)
                    }
                    _ => {
                        turns.push(TurnRecord {
                            actor,
                            claim: None,
                            path: Some(trace.path),
                        });
                        None
                    }
                }
            }
            Side::Opponent => match opponent.respond(rules, current, roll, rng) {
                ScriptedMove::Raise(claim) if beats(rules, current, claim) => {
                    if let Some(prior) = standing {
                        engine.observe_raise_resolved(opponent_id, &prior.claim, prior.roll, false);
                        engine.observe_raise_size(opponent_id, &prior.claim, &claim)?;
                    }
                    turns.push(TurnRecord {
                        actor,
                        claim: Some(claim),
                        path: None,
                    });
                    Some(claim)
                }
                _ => {
                    turns.push(TurnRecord {
                        actor,
                        claim: None,
                        path: None,
                    });
                    None
                }
            },
        };

        if let Some(claim) = raised {
            standing = Some(Standing { claim, roll });
            actor = actor.other();
            continue;
        }

        let Some(challenged) = standing else {
            return Err(RunnerError::game(format!(
                "{} challenged before any claim in round {round_index}",
                actor.as_str()
            )));
        };
        match actor {
            Side::Engine => {
                engine.observe_showdown(opponent_id, &challenged.claim, challenged.roll, true)?;
            }
            Side::Opponent => {
                engine.observe_raise_resolved(
                    opponent_id,
                    &challenged.claim,
                    challenged.roll,
                    true,
                );
            }
        }
        let held = rules.matches_roll(&challenged.claim, &challenged.roll);
        let winner = if held { actor.other() } else { actor };
        let engine_won = winner == Side::Engine;
        engine.observe_round_outcome(engine_won)?;

        return Ok(RoundOutcome {
            round_index,
            opponent: opponent_id.to_string(),
            starter,
            turns,
            paths,
            winner,
            engine_won,
        });
    }

    Err(RunnerError::game(format!(
        "round {round_index} exceeded {MAX_TURNS} turns"
    )))
}

fn beats(rules: &dyn ClaimRules, current: Option<Claim>, claim: Claim) -> bool {
    current.is_none_or(|current| rules.compare(&claim, &current) == Ordering::Greater)
}

fn write_round_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    outcome: &RoundOutcome,
) -> Result<(), RunnerError> {
    let row = RoundLogRow {
        run_id,
        round_id: format!("R{:05}", outcome.round_index),
        round_index: outcome.round_index,
        opponent: &outcome.opponent,
        starter: outcome.starter,
        turns: &outcome.turns,
        winner: outcome.winner,
    };
    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Serialize)]
struct RoundLogRow<'a> {
    run_id: &'a str,
    round_id: String,
    round_index: usize,
    opponent: &'a str,
    starter: Side,
    turns: &'a [TurnRecord],
    winner: Side,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize output: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("failed to read saved engine state {path:?}: {source}")]
    Resume {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("round simulation failed: {message}")]
    Game { message: String },
    #[error("configuration lists no opponents")]
    NoOpponents,
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}
