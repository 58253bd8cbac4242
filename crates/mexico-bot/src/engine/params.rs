use crate::bandit::DEFAULT_EXPLORATION;
use serde::{Deserialize, Serialize};
use std::env;

/// Tuning knobs for the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// LinUCB exploration coefficient applied to the confidence bonus.
    pub exploration: f64,
    /// Subtracted from the sampled challenge value before the veto check.
    pub call_risk_bias: f64,
    /// Cap on bluff-raise frequency. Validated and carried with the tuning set;
    /// the current raise policy does not consult it.
    pub raise_bluff_cap: f64,
    /// Added to the base probabilities of raising with a truthful claim.
    pub truth_bias: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            exploration: DEFAULT_EXPLORATION,
            call_risk_bias: 0.05,
            raise_bluff_cap: 0.60,
            truth_bias: 0.15,
        }
    }
}

impl EngineParams {
    pub fn from_env() -> Self {
        Self::from_reader(|key| env::var(key).ok())
    }

    /// Clamps every knob into the range the decision rules are written for.
    pub fn sanitized(self) -> Self {
        let base = Self::default();
        let pick = |value: f64, fallback: f64, lo: f64, hi: f64| {
            if value.is_finite() {
                value.clamp(lo, hi)
            } else {
                fallback
            }
        };
        Self {
            exploration: pick(self.exploration, base.exploration, 0.0, 10.0),
            call_risk_bias: pick(self.call_risk_bias, base.call_risk_bias, -1.0, 1.0),
            raise_bluff_cap: pick(self.raise_bluff_cap, base.raise_bluff_cap, 0.0, 1.0),
            truth_bias: pick(self.truth_bias, base.truth_bias, -0.7, 0.35),
        }
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base = Self::default();
        let mut parse = |key: &str, fallback: f64| {
            read(key)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
                .unwrap_or(fallback)
        };

        Self {
            exploration: parse("MEX_ENGINE_EXPLORATION", base.exploration),
            call_risk_bias: parse("MEX_ENGINE_CALL_RISK_BIAS", base.call_risk_bias),
            raise_bluff_cap: parse("MEX_ENGINE_RAISE_BLUFF_CAP", base.raise_bluff_cap),
            truth_bias: parse("MEX_ENGINE_TRUTH_BIAS", base.truth_bias),
        }
        .sanitized()
    }
}
