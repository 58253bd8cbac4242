use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mexico_bot::DecisionPath;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::tournament::RoundOutcome;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("opponent '{0}' played a round but is missing from configuration")]
    UnknownOpponent(String),
    #[error("standard normal unavailable: {0}")]
    Distribution(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Per-opponent win tallies gathered while rounds are played.
pub struct AnalyticsCollector {
    opponents: Vec<OpponentAccumulator>,
    path_counts: BTreeMap<&'static str, usize>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        Self {
            opponents: config
                .opponents
                .iter()
                .map(|opponent| OpponentAccumulator::new(opponent.name.clone()))
                .collect(),
            path_counts: BTreeMap::new(),
        }
    }

    pub fn record_round(&mut self, outcome: &RoundOutcome) -> Result<(), AnalyticsError> {
        let acc = self
            .opponents
            .iter_mut()
            .find(|acc| acc.name == outcome.opponent)
            .ok_or_else(|| AnalyticsError::UnknownOpponent(outcome.opponent.clone()))?;
        acc.rounds += 1;
        if outcome.engine_won {
            acc.engine_wins += 1;
        }
        for path in &outcome.paths {
            *self.path_counts.entry(path.as_str()).or_default() += 1;
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<AnalyticsSummary, AnalyticsError> {
        let normal =
            Normal::new(0.0, 1.0).map_err(|err| AnalyticsError::Distribution(err.to_string()))?;
        let mut opponents: Vec<OpponentReport> = self
            .opponents
            .into_iter()
            .map(|acc| acc.into_report(&normal))
            .collect();

        let total = OpponentAccumulator {
            name: "all".to_string(),
            rounds: opponents.iter().map(|report| report.rounds).sum(),
            engine_wins: opponents.iter().map(|report| report.engine_wins).sum(),
        }
        .into_report(&normal);
        opponents.retain(|report| report.rounds > 0);

        Ok(AnalyticsSummary {
            opponents,
            total,
            path_counts: self.path_counts,
        })
    }
}

struct OpponentAccumulator {
    name: String,
    rounds: usize,
    engine_wins: usize,
}

impl OpponentAccumulator {
    fn new(name: String) -> Self {
        Self {
            name,
            rounds: 0,
            engine_wins: 0,
        }
    }

    fn into_report(self, normal: &Normal) -> OpponentReport {
        let win_rate = if self.rounds == 0 {
            0.0
        } else {
            self.engine_wins as f64 / self.rounds as f64
        };
        OpponentReport {
            ci95: confidence_interval(win_rate, self.rounds),
            p_value: p_value_vs_even(win_rate, self.rounds, normal),
            name: self.name,
            rounds: self.rounds,
            engine_wins: self.engine_wins,
            win_rate,
        }
    }
}

/// Normal-approximation interval for a win rate, clamped to `[0, 1]`.
pub fn confidence_interval(win_rate: f64, rounds: usize) -> (f64, f64) {
    if rounds == 0 {
        return (0.0, 0.0);
    }
    let stderr = (win_rate * (1.0 - win_rate) / rounds as f64).sqrt();
    let margin = CONFIDENCE_Z * stderr;
    ((win_rate - margin).max(0.0), (win_rate + margin).min(1.0))
}

/// Two-sided p-value of the win rate against an even 50% split.
pub fn p_value_vs_even(win_rate: f64, rounds: usize, normal: &Normal) -> f64 {
    if rounds == 0 {
        return 1.0;
    }
    let stderr = (0.25 / rounds as f64).sqrt();
    let z = (win_rate - 0.5).abs() / stderr;
    let p = 2.0 * (1.0 - normal.cdf(z));
    p.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct OpponentReport {
    pub name: String,
    pub rounds: usize,
    pub engine_wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub p_value: f64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub opponents: Vec<OpponentReport>,
    pub total: OpponentReport,
    pub path_counts: BTreeMap<&'static str, usize>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Mexico Engine Summary\n\n");
        rows.push_str("| Opponent | Rounds | Engine wins | Win % | 95% CI | p-value vs 50% |\n");
        rows.push_str("|----------|--------|-------------|-------|--------|----------------|\n");
        for report in self.opponents.iter().chain(std::iter::once(&self.total)) {
            rows.push_str(&format!(
                "| {name} | {rounds} | {wins} | {win:.1}% | [{ci_low:.3}, {ci_high:.3}] | {pval:.3} |\n",
                name = report.name,
                rounds = report.rounds,
                wins = report.engine_wins,
                win = report.win_rate * 100.0,
                ci_low = report.ci95.0,
                ci_high = report.ci95.1,
                pval = report.p_value,
            ));
        }

        rows.push_str("\n## Decision paths\n\n");
        rows.push_str("| Path | Count |\n");
        rows.push_str("|------|-------|\n");
        for (path, count) in &self.path_counts {
            rows.push_str(&format!("| {path} | {count} |\n"));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn path_count(&self, path: DecisionPath) -> usize {
        self.path_counts.get(path.as_str()).copied().unwrap_or(0)
    }
}
