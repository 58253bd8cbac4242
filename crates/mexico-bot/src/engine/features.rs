//! Encoding of a challenge/raise situation into bandit features.

use crate::bandit::{Action, FEATURE_DIM, FeatureVector};
use mexico_core::model::{DOUBLE, MEXICAN, NORMAL};

pub const MEXICAN_SLOT: usize = 0;
pub const DOUBLE_SLOT: usize = 1;
pub const NORMAL_SLOT: usize = 2;
pub const BLUFF_MEAN_SLOT: usize = 3;
pub const CALL_MEAN_SLOT: usize = 4;
pub const HAS_TRUTHFUL_SLOT: usize = 5;
pub const DISTANCE_SLOT: usize = 6;
pub const ROUND_SLOT: usize = 7;
pub const ACTION_SLOT: usize = 8;

/// Everything the engine knows about the claim it is answering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimContext<'a> {
    pub category: &'a str,
    pub bluff_mean: f64,
    pub call_mean: f64,
    pub has_truthful: bool,
    pub distance: f64,
    pub round_index: u32,
}

impl ClaimContext<'_> {
    /// The vectors for both arms differ only in the action slot.
    pub fn encode(&self, action: Action) -> FeatureVector {
        let mut x = [0.0; FEATURE_DIM];
        match self.category {
            MEXICAN => x[MEXICAN_SLOT] = 1.0,
            DOUBLE => x[DOUBLE_SLOT] = 1.0,
            NORMAL => x[NORMAL_SLOT] = 1.0,
            _ => {}
        }
        x[BLUFF_MEAN_SLOT] = self.bluff_mean;
        x[CALL_MEAN_SLOT] = self.call_mean;
        x[HAS_TRUTHFUL_SLOT] = if self.has_truthful { 1.0 } else { 0.0 };
        x[DISTANCE_SLOT] = self.distance;
        x[ROUND_SLOT] = f64::from(self.round_index);
        x[ACTION_SLOT] = match action {
            Action::Challenge => 0.0,
            Action::Raise => 1.0,
        };
        x
    }
}
