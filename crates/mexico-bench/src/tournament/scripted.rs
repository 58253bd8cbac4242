use std::cmp::Ordering;

use mexico_core::{Claim, ClaimRules, Roll};
use rand::Rng;

use crate::config::OpponentConfig;

/// What a scripted opponent does on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedMove {
    Challenge,
    Raise(Claim),
}

/// Opponent with fixed tendencies read from the bench config.
#[derive(Debug, Clone)]
pub struct ScriptedOpponent {
    name: String,
    bluff_rate: f64,
    call_rate: f64,
    small_raise_rate: f64,
}

impl ScriptedOpponent {
    pub fn from_config(config: &OpponentConfig) -> Self {
        Self {
            name: config.name.clone(),
            bluff_rate: config.bluff_rate,
            call_rate: config.call_rate,
            small_raise_rate: config.small_raise_rate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Challenges with `call_rate`, otherwise claims the roll when it beats
    /// the current claim. With `bluff_rate` (or when the roll is too weak) it
    /// escalates one or two steps past the stronger of roll and claim.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        rules: &dyn ClaimRules,
        current: Option<Claim>,
        roll: Roll,
        rng: &mut R,
    ) -> ScriptedMove {
        if current.is_some() && rng.r#gen::<f64>() < self.call_rate {
            return ScriptedMove::Challenge;
        }

        let truthful = Claim::from_roll(roll);
        let honest = match current {
            Some(claim) if rules.compare(&truthful, &claim) != Ordering::Greater => None,
            _ => Some(truthful),
        };
        let bluffing = rng.r#gen::<f64>() < self.bluff_rate;

        match (honest, bluffing) {
            (Some(claim), false) => ScriptedMove::Raise(claim),
            (None, false) => ScriptedMove::Challenge,
            (_, true) => {
                let base = match current {
                    Some(claim) if rules.compare(&claim, &truthful) == Ordering::Greater => claim,
                    _ => truthful,
                };
                let steps = if rng.r#gen::<f64>() < self.small_raise_rate {
                    1
                } else {
                    2
                };
                let bluff = (0..steps).fold(base, |claim, _| rules.next_higher(&claim));
                match current {
                    Some(claim) if rules.compare(&bluff, &claim) != Ordering::Greater => {
                        ScriptedMove::Challenge
                    }
                    _ => ScriptedMove::Raise(bluff),
                }
            }
        }
    }
}
