//! Challenge-or-raise decisions against individual opponents.
//!
//! Opening claims and strong truthful hands are handled by fixed rules. Every
//! other response goes through the shared [`LinUcb`] bandit, whose advice to
//! challenge is vetoed when a Thompson draw of the opponent's bluff rate makes
//! the challenge look too expensive. The bandit decision is parked in a single
//! pending slot until the round's outcome is reported.

mod error;
pub mod features;
mod params;
mod snapshot;

pub use error::EngineError;
pub use features::ClaimContext;
pub use params::EngineParams;
pub use snapshot::{BanditState, EngineState, ProfileState};

use crate::bandit::{Action, ArmScore, FeatureVector, LinUcb};
use crate::belief::OpponentProfile;
use mexico_core::model::NORMAL;
use mexico_core::{Claim, ClaimRules, Roll};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use tracing::{Level, event};

/// Claim the opening escalation counts up from.
const OPENING_BASELINE: Claim = match Claim::new(3, 2) {
    Some(claim) => claim,
    None => panic!("baseline faces are on the die"),
};
/// Base probability of answering with a truthful claim before the bandit runs.
const FAST_TRUTH_BASE: f64 = 0.65;
/// Base probability of preferring the truthful claim when the bandit says raise.
const RAISE_TRUTH_BASE: f64 = 0.70;
/// Lowest sampled challenge value the engine will still act on.
const CHALLENGE_EV_FLOOR: f64 = -0.15;
const DISTANCE_SEARCH_LIMIT: u32 = 20;
const STEP_SEARCH_LIMIT: u32 = 30;
const PRESSURE_SECOND_STEP_CALL_RATE: f64 = 0.55;
const PRESSURE_THIRD_STEP_CALL_RATE: f64 = 0.65;
const PRESSURE_SECOND_STEP_CHANCE: f64 = 0.50;
const PRESSURE_THIRD_STEP_CHANCE: f64 = 0.25;

type SharedRules = Box<dyn ClaimRules + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "claim")]
pub enum Decision {
    Challenge,
    Raise(Claim),
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Challenge => f.write_str("challenge"),
            Decision::Raise(claim) => write!(f, "raise {claim}"),
        }
    }
}

/// Which branch of the decision rules produced a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    Opening,
    TruthfulFastPath,
    BanditChallenge,
    BanditRaise,
    ChallengeVetoed,
    /// The bandit preferred raising but no claim ranks above the current one.
    NoHigherClaim,
}

impl DecisionPath {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionPath::Opening => "opening",
            DecisionPath::TruthfulFastPath => "truthful_fast_path",
            DecisionPath::BanditChallenge => "bandit_challenge",
            DecisionPath::BanditRaise => "bandit_raise",
            DecisionPath::ChallengeVetoed => "challenge_vetoed",
            DecisionPath::NoHigherClaim => "no_higher_claim",
        }
    }

    /// Whether the decision left a context waiting for a round reward.
    pub const fn feeds_bandit(self) -> bool {
        matches!(
            self,
            DecisionPath::BanditChallenge
                | DecisionPath::BanditRaise
                | DecisionPath::ChallengeVetoed
                | DecisionPath::NoHigherClaim
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTrace {
    pub decision: Decision,
    pub path: DecisionPath,
    pub scores: Option<Vec<ArmScore<Action>>>,
}

/// The bandit decision awaiting its reward.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingContext {
    pub opponent_id: String,
    pub action: Action,
    pub features: FeatureVector,
}

pub struct DecisionEngine {
    rules: Option<SharedRules>,
    bandit: LinUcb,
    profiles: HashMap<String, OpponentProfile>,
    params: EngineParams,
    pending: Option<PendingContext>,
    rng: StdRng,
}

impl DecisionEngine {
    pub fn new(params: EngineParams) -> Self {
        Self::with_rng(params, StdRng::from_entropy())
    }

    /// Reproducible engine for simulations and tests.
    pub fn with_seed(params: EngineParams, seed: u64) -> Self {
        Self::with_rng(params, StdRng::seed_from_u64(seed))
    }

    fn with_rng(params: EngineParams, rng: StdRng) -> Self {
        let params = params.sanitized();
        Self {
            rules: None,
            bandit: LinUcb::new(params.exploration),
            profiles: HashMap::new(),
            params,
            pending: None,
            rng,
        }
    }

    pub fn with_rules<R>(mut self, rules: R) -> Self
    where
        R: ClaimRules + Send + Sync + 'static,
    {
        self.set_rules(rules);
        self
    }

    pub fn set_rules<R>(&mut self, rules: R)
    where
        R: ClaimRules + Send + Sync + 'static,
    {
        self.rules = Some(Box::new(rules));
    }

    pub fn has_rules(&self) -> bool {
        self.rules.is_some()
    }

    pub fn params(&self) -> EngineParams {
        self.params
    }

    pub fn bandit(&self) -> &LinUcb {
        &self.bandit
    }

    pub fn pending(&self) -> Option<&PendingContext> {
        self.pending.as_ref()
    }

    pub fn profile(&self, opponent_id: &str) -> Option<&OpponentProfile> {
        self.profiles.get(opponent_id)
    }

    /// Profile for `opponent_id`, created with default priors on first contact.
    pub fn profile_mut(&mut self, opponent_id: &str) -> &mut OpponentProfile {
        profile_entry(&mut self.profiles, opponent_id)
    }

    pub fn opponents(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn decide(
        &mut self,
        opponent_id: &str,
        current_claim: Option<Claim>,
        my_roll: Roll,
        round_index: u32,
    ) -> Result<Decision, EngineError> {
        self.decide_traced(opponent_id, current_claim, my_roll, round_index)
            .map(|trace| trace.decision)
    }

    /// Like [`DecisionEngine::decide`], also reporting the branch taken and
    /// the bandit scores when the bandit was consulted.
    pub fn decide_traced(
        &mut self,
        opponent_id: &str,
        current_claim: Option<Claim>,
        my_roll: Roll,
        round_index: u32,
    ) -> Result<DecisionTrace, EngineError> {
        let Self {
            rules,
            bandit,
            profiles,
            params,
            pending,
            rng,
        } = self;
        let grammar = Grammar::new(rules.as_deref().ok_or(EngineError::RulesNotConfigured)?);

        let Some(current) = current_claim else {
            let claim = grammar.opening_claim(my_roll, rng);
            *pending = None;
            let trace = DecisionTrace {
                decision: Decision::Raise(claim),
                path: DecisionPath::Opening,
                scores: None,
            };
            log_decision(opponent_id, round_index, None, &trace);
            return Ok(trace);
        };

        let truthful = grammar.best_truthful_above(&current, my_roll);
        if let Some(claim) = truthful {
            if rng.r#gen::<f64>() < FAST_TRUTH_BASE + params.truth_bias {
                *pending = None;
                let trace = DecisionTrace {
                    decision: Decision::Raise(claim),
                    path: DecisionPath::TruthfulFastPath,
                    scores: None,
                };
                log_decision(opponent_id, round_index, Some(current), &trace);
                return Ok(trace);
            }
        }

        let profile = profile_entry(profiles, opponent_id);
        let category = grammar.rules.categorize(&current);
        let bluff_mean = profile.bluff_rate_mut(&category).mean();
        let call_mean = profile.call_rate().mean();
        let context = ClaimContext {
            category: &category,
            bluff_mean,
            call_mean,
            has_truthful: truthful.is_some(),
            distance: grammar.distance_to_truth(&current, my_roll),
            round_index,
        };
        let challenge_x = context.encode(Action::Challenge);
        let raise_x = context.encode(Action::Raise);

        let choice = bandit.choose(&[(Action::Challenge, challenge_x), (Action::Raise, raise_x)])?;

        let mut path = DecisionPath::BanditRaise;
        if choice.arm == Action::Challenge {
            let sampled_bluff = profile.bluff_rate_mut(&category).sample(rng);
            let challenge_value = 2.0 * sampled_bluff - 1.0 - params.call_risk_bias;
            if challenge_value >= CHALLENGE_EV_FLOOR {
                *pending = Some(PendingContext {
                    opponent_id: opponent_id.to_string(),
                    action: Action::Challenge,
                    features: challenge_x,
                });
                let trace = DecisionTrace {
                    decision: Decision::Challenge,
                    path: DecisionPath::BanditChallenge,
                    scores: Some(choice.scores),
                };
                log_decision(opponent_id, round_index, Some(current), &trace);
                return Ok(trace);
            }
            tracing::debug!(
                target: "mexico_bot::decision",
                opponent = opponent_id,
                category = %category,
                sampled_bluff,
                challenge_value,
                "challenge vetoed"
            );
            path = DecisionPath::ChallengeVetoed;
        }

        let raise = match truthful {
            Some(claim) if rng.r#gen::<f64>() < RAISE_TRUTH_BASE + params.truth_bias => Some(claim),
            _ => grammar.pressure_claim(&current, call_mean, rng),
        };
        let Some(claim) = raise else {
            // Nothing ranks above `current`; calling it is the only legal move.
            *pending = Some(PendingContext {
                opponent_id: opponent_id.to_string(),
                action: Action::Challenge,
                features: challenge_x,
            });
            let trace = DecisionTrace {
                decision: Decision::Challenge,
                path: DecisionPath::NoHigherClaim,
                scores: Some(choice.scores),
            };
            log_decision(opponent_id, round_index, Some(current), &trace);
            return Ok(trace);
        };
        *pending = Some(PendingContext {
            opponent_id: opponent_id.to_string(),
            action: Action::Raise,
            features: raise_x,
        });
        let trace = DecisionTrace {
            decision: Decision::Raise(claim),
            path,
            scores: Some(choice.scores),
        };
        log_decision(opponent_id, round_index, Some(current), &trace);
        Ok(trace)
    }

    /// Records whether a claim the opponent made turned out to be a bluff.
    pub fn observe_showdown(
        &mut self,
        opponent_id: &str,
        claim: &Claim,
        actual_roll: Roll,
        caller_is_engine: bool,
    ) -> Result<(), EngineError> {
        let rules = self
            .rules
            .as_deref()
            .ok_or(EngineError::RulesNotConfigured)?;
        let was_bluff = !rules.matches_roll(claim, &actual_roll);
        let category = rules.categorize(claim);
        let tracker = profile_entry(&mut self.profiles, opponent_id).bluff_rate_mut(&category);
        tracker.update(was_bluff);
        event!(
            target: "mexico_bot::observe",
            Level::DEBUG,
            opponent = opponent_id,
            claim = %claim,
            roll = %actual_roll,
            category = %category,
            was_bluff,
            caller_is_engine,
            bluff_mean = tracker.mean(),
        );
        Ok(())
    }

    /// Records whether the opponent challenged one of the engine's raises.
    pub fn observe_raise_resolved(
        &mut self,
        opponent_id: &str,
        claim: &Claim,
        roll: Roll,
        was_challenged: bool,
    ) {
        let tracker = self.profile_mut(opponent_id).call_rate_mut();
        tracker.update(was_challenged);
        event!(
            target: "mexico_bot::observe",
            Level::DEBUG,
            opponent = opponent_id,
            claim = %claim,
            roll = %roll,
            was_challenged,
            call_mean = tracker.mean(),
        );
    }

    /// Records whether the opponent raised by exactly one step.
    pub fn observe_raise_size(
        &mut self,
        opponent_id: &str,
        previous: &Claim,
        new: &Claim,
    ) -> Result<(), EngineError> {
        let rules = self
            .rules
            .as_deref()
            .ok_or(EngineError::RulesNotConfigured)?;
        let steps = Grammar::new(rules).steps_between(previous, new, STEP_SEARCH_LIMIT);
        let tracker = profile_entry(&mut self.profiles, opponent_id).small_raise_pref_mut();
        tracker.update(steps == 1);
        event!(
            target: "mexico_bot::observe",
            Level::DEBUG,
            opponent = opponent_id,
            previous = %previous,
            new = %new,
            steps,
            small_raise_mean = tracker.mean(),
        );
        Ok(())
    }

    /// Rewards the pending bandit decision, if any, and clears the slot.
    pub fn observe_round_outcome(&mut self, engine_won: bool) -> Result<(), EngineError> {
        let Some(context) = self.pending.take() else {
            return Ok(());
        };
        let reward = if engine_won { 1.0 } else { -1.0 };
        self.bandit.update(&context.features, reward)?;
        event!(
            target: "mexico_bot::observe",
            Level::DEBUG,
            opponent = %context.opponent_id,
            action = %context.action,
            reward,
        );
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            bandit: Some(BanditState::capture(&self.bandit)),
            profiles: self
                .profiles
                .iter()
                .map(|(id, profile)| (id.clone(), ProfileState::capture(profile)))
                .collect(),
        }
    }

    /// Replaces the bandit (when present) and every listed profile.
    ///
    /// Nothing is modified unless the whole state validates. Profiles absent
    /// from `state` are kept; the pending slot is cleared.
    pub fn load_state(&mut self, state: &EngineState) -> Result<(), EngineError> {
        let bandit = match &state.bandit {
            Some(saved) => Some(saved.restore(self.params.exploration).inspect_err(|err| {
                tracing::warn!(target: "mexico_bot::state", error = %err, "rejected bandit state");
            })?),
            None => None,
        };
        let mut restored = Vec::with_capacity(state.profiles.len());
        for (id, saved) in &state.profiles {
            let profile = saved.restore(id).inspect_err(|err| {
                tracing::warn!(target: "mexico_bot::state", error = %err, "rejected profile state");
            })?;
            restored.push((id.clone(), profile));
        }

        if let Some(bandit) = bandit {
            self.bandit = bandit;
        }
        let loaded = restored.len();
        self.profiles.extend(restored);
        self.pending = None;
        tracing::info!(
            target: "mexico_bot::state",
            profiles = loaded,
            bandit = state.bandit.is_some(),
            "engine state loaded"
        );
        Ok(())
    }
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("has_rules", &self.rules.is_some())
            .field("bandit", &self.bandit)
            .field("profiles", &self.profiles.len())
            .field("params", &self.params)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

fn profile_entry<'a>(
    profiles: &'a mut HashMap<String, OpponentProfile>,
    opponent_id: &str,
) -> &'a mut OpponentProfile {
    profiles.entry(opponent_id.to_string()).or_default()
}

/// Number of escalation steps taken by a pressure claim.
///
/// Both extra-step checks read the same draw `r`, so a third step only ever
/// happens together with the second.
pub fn pressure_steps(call_mean: f64, r: f64) -> u32 {
    let mut extra = 0;
    if call_mean > PRESSURE_SECOND_STEP_CALL_RATE && r < PRESSURE_SECOND_STEP_CHANCE {
        extra = 1;
    }
    if call_mean > PRESSURE_THIRD_STEP_CALL_RATE && r < PRESSURE_THIRD_STEP_CHANCE {
        extra = 2;
    }
    1 + extra
}

/// Claim-order helpers over the injected rules.
struct Grammar<'a> {
    rules: &'a (dyn ClaimRules + Send + Sync),
}

impl<'a> Grammar<'a> {
    fn new(rules: &'a (dyn ClaimRules + Send + Sync)) -> Self {
        Self { rules }
    }

    fn advance(&self, claim: &Claim, steps: u32) -> Claim {
        (0..steps).fold(*claim, |current, _| self.rules.next_higher(&current))
    }

    fn best_truthful_above(&self, current: &Claim, roll: Roll) -> Option<Claim> {
        let truthful = Claim::from_roll(roll);
        (self.rules.compare(&truthful, current) == Ordering::Greater).then_some(truthful)
    }

    /// Escalates weak openings; stronger truthful claims are opened as is.
    fn opening_claim<R: Rng + ?Sized>(&self, roll: Roll, rng: &mut R) -> Claim {
        let truthful = Claim::from_roll(roll);
        if self.rules.categorize(&truthful) != NORMAL {
            return truthful;
        }
        let start = match self.rules.compare(&truthful, &OPENING_BASELINE) {
            Ordering::Greater => truthful,
            _ => OPENING_BASELINE,
        };
        let steps = if rng.gen_range(0..3) == 2 { 2 } else { 1 };
        self.advance(&start, steps)
    }

    /// `None` when the rules have nothing above `current`.
    fn pressure_claim<R: Rng + ?Sized>(
        &self,
        current: &Claim,
        call_mean: f64,
        rng: &mut R,
    ) -> Option<Claim> {
        let r = rng.r#gen::<f64>();
        let claim = self.advance(current, pressure_steps(call_mean, r));
        (self.rules.compare(&claim, current) == Ordering::Greater).then_some(claim)
    }

    /// Steps from `current` up to the truthful claim for `roll`, 0 if it is not above.
    fn distance_to_truth(&self, current: &Claim, roll: Roll) -> f64 {
        let truthful = Claim::from_roll(roll);
        f64::from(self.steps_between(current, &truthful, DISTANCE_SEARCH_LIMIT))
    }

    fn steps_between(&self, from: &Claim, to: &Claim, limit: u32) -> u32 {
        if self.rules.compare(from, to) != Ordering::Less {
            return 0;
        }
        let mut steps = 0;
        let mut current = *from;
        while self.rules.compare(&current, to) == Ordering::Less && steps < limit {
            current = self.rules.next_higher(&current);
            steps += 1;
        }
        steps
    }
}

fn log_decision(
    opponent_id: &str,
    round_index: u32,
    current: Option<Claim>,
    trace: &DecisionTrace,
) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let current = current.map(|claim| claim.to_string()).unwrap_or_default();
    let (challenge_score, raise_score) = trace
        .scores
        .as_deref()
        .map(|scores| {
            let total = |arm| {
                scores
                    .iter()
                    .find(|score| score.arm == arm)
                    .map(ArmScore::total)
                    .unwrap_or(f64::NAN)
            };
            (total(Action::Challenge), total(Action::Raise))
        })
        .unwrap_or((f64::NAN, f64::NAN));

    event!(
        target: "mexico_bot::decision",
        Level::INFO,
        opponent = opponent_id,
        round_index,
        current = %current,
        path = trace.path.as_str(),
        decision = %trace.decision,
        challenge_score,
        raise_score,
    );
}
