//! Linear upper-confidence-bound bandit over challenge/raise contexts.

mod linalg;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const FEATURE_DIM: usize = 9;

pub type FeatureVector = [f64; FEATURE_DIM];
pub type DesignMatrix = [[f64; FEATURE_DIM]; FEATURE_DIM];

pub const DEFAULT_EXPLORATION: f64 = 0.9;

/// The two arms the engine asks the bandit about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Challenge,
    Raise,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Challenge => "challenge",
            Action::Raise => "raise",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BanditError {
    #[error("design matrix is not positive-definite (pivot {pivot})")]
    NotPositiveDefinite { pivot: usize },
    #[error("design matrix is not symmetric")]
    Asymmetric,
    #[error("non-finite value in {what}")]
    NonFinite { what: &'static str },
    #[error("no arms to choose from")]
    NoArms,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmScore<A> {
    pub arm: A,
    pub mean: f64,
    pub bonus: f64,
}

impl<A> ArmScore<A> {
    pub fn total(&self) -> f64 {
        self.mean + self.bonus
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BanditChoice<A> {
    pub arm: A,
    pub scores: Vec<ArmScore<A>>,
}

/// LinUCB with a single shared parameter vector.
///
/// `design` starts at the identity and only ever gains outer products, so it
/// stays symmetric positive-definite.
#[derive(Debug, Clone, PartialEq)]
pub struct LinUcb {
    exploration: f64,
    design: DesignMatrix,
    rewards: FeatureVector,
}

impl LinUcb {
    pub fn new(exploration: f64) -> Self {
        Self {
            exploration,
            design: linalg::identity(),
            rewards: [0.0; FEATURE_DIM],
        }
    }

    /// Rebuilds a bandit from persisted parts, rejecting anything that could not
    /// have come from `new` plus updates.
    pub fn from_parts(
        exploration: f64,
        design: DesignMatrix,
        rewards: FeatureVector,
    ) -> Result<Self, BanditError> {
        if design.iter().flatten().any(|value| !value.is_finite()) {
            return Err(BanditError::NonFinite { what: "design" });
        }
        if rewards.iter().any(|value| !value.is_finite()) {
            return Err(BanditError::NonFinite { what: "rewards" });
        }
        if !linalg::is_symmetric(&design) {
            return Err(BanditError::Asymmetric);
        }
        linalg::cholesky(&design)?;
        Ok(Self {
            exploration,
            design,
            rewards,
        })
    }

    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }

    pub fn rewards(&self) -> &FeatureVector {
        &self.rewards
    }

    /// Scores each arm by `θᵀx + α·√(xᵀA⁻¹x)` and returns the best one.
    ///
    /// Ties go to the earliest arm in `contexts`.
    pub fn choose<A: Copy>(
        &self,
        contexts: &[(A, FeatureVector)],
    ) -> Result<BanditChoice<A>, BanditError> {
        if contexts.is_empty() {
            return Err(BanditError::NoArms);
        }

        let inverse = linalg::invert_spd(&self.design)?;
        let theta = linalg::mat_vec(&inverse, &self.rewards);

        let mut scores = Vec::with_capacity(contexts.len());
        let mut best: Option<(A, f64)> = None;
        for (arm, x) in contexts {
            let mean = linalg::dot(&theta, x);
            let spread = linalg::dot(x, &linalg::mat_vec(&inverse, x)).max(0.0);
            let bonus = self.exploration * spread.sqrt();
            let score = ArmScore {
                arm: *arm,
                mean,
                bonus,
            };
            let total = score.total();
            if !total.is_finite() {
                return Err(BanditError::NonFinite { what: "score" });
            }
            if best.is_none_or(|(_, top)| total > top) {
                best = Some((*arm, total));
            }
            scores.push(score);
        }

        let (arm, _) = best.ok_or(BanditError::NoArms)?;
        Ok(BanditChoice { arm, scores })
    }

    /// `A += x·xᵀ`, `b += reward·x`.
    pub fn update(&mut self, x: &FeatureVector, reward: f64) -> Result<(), BanditError> {
        if !reward.is_finite() || x.iter().any(|value| !value.is_finite()) {
            return Err(BanditError::NonFinite { what: "update" });
        }
        for (i, row) in self.design.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell += x[i] * x[j];
            }
        }
        for (slot, value) in self.rewards.iter_mut().zip(x.iter()) {
            *slot += reward * value;
        }
        Ok(())
    }
}

impl Default for LinUcb {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLORATION)
    }
}
