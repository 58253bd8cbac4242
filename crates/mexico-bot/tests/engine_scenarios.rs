use std::cmp::Ordering;
use std::collections::BTreeMap;

use mexico_bot::bandit::{DesignMatrix, FEATURE_DIM, FeatureVector};
use mexico_bot::engine::features::{ACTION_SLOT, MEXICAN_SLOT};
use mexico_bot::engine::{BanditState, ProfileState};
use mexico_bot::{
    Action, Decision, DecisionEngine, DecisionPath, EngineError, EngineParams, EngineState,
};
use mexico_core::{Claim, ClaimRules, MexicoRules, Roll};

fn claim(text: &str) -> Claim {
    text.parse().unwrap()
}

fn roll(a: u8, b: u8) -> Roll {
    Roll::new(a, b).unwrap()
}

fn identity() -> DesignMatrix {
    let mut a = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    for (i, row) in a.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    a
}

/// Bandit whose learned weights strongly penalise raising.
fn challenge_leaning_bandit() -> BanditState {
    let mut b: FeatureVector = [0.0; FEATURE_DIM];
    b[FEATURE_DIM - 1] = -50.0;
    BanditState {
        design: identity(),
        b,
    }
}

fn profile_with_double_bluff(alpha: f64, beta: f64) -> ProfileState {
    ProfileState {
        bluff_rate: BTreeMap::from([("double".to_string(), (alpha, beta))]),
        call_rate: (1.0, 2.0),
        small_raise_pref: (1.0, 1.0),
    }
}

fn challenges_out_of(decisions: usize, profile: ProfileState, seed: u64) -> usize {
    let mut engine = DecisionEngine::with_seed(EngineParams::default(), seed).with_rules(MexicoRules);
    let state = EngineState {
        bandit: Some(challenge_leaning_bandit()),
        profiles: BTreeMap::from([("opp".to_string(), profile)]),
    };
    engine.load_state(&state).unwrap();

    (0..decisions)
        .filter(|round| {
            let decision = engine
                .decide("opp", Some(claim("55")), roll(3, 1), *round as u32)
                .unwrap();
            decision == Decision::Challenge
        })
        .count()
}

#[test]
fn opening_with_four_two_escalates_above_it() {
    let rules = MexicoRules;
    for seed in 0..100 {
        let mut engine =
            DecisionEngine::with_seed(EngineParams::default(), seed).with_rules(MexicoRules);
        let trace = engine.decide_traced("opp", None, roll(4, 2), 0).unwrap();
        assert_eq!(trace.path, DecisionPath::Opening);
        match trace.decision {
            Decision::Raise(opening) => {
                assert_eq!(rules.compare(&opening, &claim("42")), Ordering::Greater);
                assert!(opening == claim("43") || opening == claim("51"));
            }
            Decision::Challenge => panic!("opening must be a claim"),
        }
        assert!(engine.pending().is_none());
    }
}

#[test]
fn weak_openings_take_one_step_twice_as_often_as_two() {
    let mut engine = DecisionEngine::with_seed(EngineParams::default(), 314).with_rules(MexicoRules);
    let mut one_step = 0;
    for round in 0..3000 {
        match engine.decide("opp", None, roll(1, 3), round).unwrap() {
            Decision::Raise(opening) if opening == claim("41") => one_step += 1,
            Decision::Raise(opening) => assert_eq!(opening, claim("42")),
            Decision::Challenge => panic!("opening must be a claim"),
        }
    }
    assert!((1850..=2150).contains(&one_step), "one step {one_step} of 3000");
}

/// Share of bandit raises that repeat the truthful claim for (5,2) over 41.
fn truthful_share_of_bandit_raises(truth_bias: f64, decisions: u32) -> (usize, f64) {
    let params = EngineParams {
        truth_bias,
        ..EngineParams::default()
    };
    let mut engine = DecisionEngine::with_seed(params, 2718).with_rules(MexicoRules);
    let mut raises = 0;
    let mut truthful = 0;
    for round in 0..decisions {
        let trace = engine
            .decide_traced("opp", Some(claim("41")), roll(5, 2), round)
            .unwrap();
        if trace.path != DecisionPath::BanditRaise {
            continue;
        }
        raises += 1;
        match trace.decision {
            Decision::Raise(raised) if raised == claim("52") => truthful += 1,
            // Default call prior stays below every extra-step threshold.
            Decision::Raise(raised) => assert_eq!(raised, claim("42")),
            Decision::Challenge => panic!("bandit raise must raise"),
        }
    }
    (raises, truthful as f64 / raises as f64)
}

#[test]
fn bandit_raises_prefer_the_truthful_claim() {
    let (raises, share) = truthful_share_of_bandit_raises(0.0, 4000);
    assert!(raises > 1000, "only {raises} bandit raises");
    assert!((0.64..=0.76).contains(&share), "truthful share {share}");
}

#[test]
fn negative_truth_bias_turns_raises_into_pressure() {
    let (raises, share) = truthful_share_of_bandit_raises(-0.65, 2000);
    assert_eq!(raises, 2000);
    assert!((0.025..=0.08).contains(&share), "truthful share {share}");
}

#[test]
fn nothing_above_mexico_forces_a_challenge() {
    for seed in 0..200 {
        let mut engine =
            DecisionEngine::with_seed(EngineParams::default(), seed).with_rules(MexicoRules);
        let trace = engine
            .decide_traced("opp", Some(claim("21")), roll(3, 1), 0)
            .unwrap();
        assert_eq!(trace.decision, Decision::Challenge, "seed {seed}");
        assert_eq!(trace.path, DecisionPath::NoHigherClaim);
        assert!(trace.path.feeds_bandit());

        let pending = engine.pending().expect("challenge context parked");
        assert_eq!(pending.action, Action::Challenge);
        assert_eq!(pending.features[ACTION_SLOT], 0.0);
        assert_eq!(pending.features[MEXICAN_SLOT], 1.0);
    }

    let mut engine = DecisionEngine::with_seed(EngineParams::default(), 9).with_rules(MexicoRules);
    engine
        .decide("opp", Some(claim("21")), roll(6, 6), 0)
        .unwrap();
    engine.observe_round_outcome(true).unwrap();
    let bandit = engine.state().bandit.unwrap();
    assert_eq!(bandit.b[ACTION_SLOT], 0.0);
    assert_eq!(bandit.b[MEXICAN_SLOT], 1.0);
}

#[test]
fn maximal_truth_bias_always_takes_the_fast_path() {
    let params = EngineParams {
        truth_bias: 0.35,
        ..EngineParams::default()
    };
    let mut engine = DecisionEngine::with_seed(params, 77).with_rules(MexicoRules);
    for round in 0..50 {
        let trace = engine
            .decide_traced("opp", Some(claim("51")), roll(2, 2), round)
            .unwrap();
        assert_eq!(trace.path, DecisionPath::TruthfulFastPath);
        assert_eq!(trace.decision, Decision::Raise(claim("22")));
    }
    assert!(engine.pending().is_none());
}

#[test]
fn likely_bluffers_are_challenged_more_often() {
    let mut low_total = 0;
    let mut high_total = 0;
    for seed in [3, 17, 99] {
        low_total += challenges_out_of(200, profile_with_double_bluff(2.0, 10.0), seed);
        high_total += challenges_out_of(200, profile_with_double_bluff(9.0, 1.0), seed);
    }
    assert!(high_total > low_total, "high {high_total} vs low {low_total}");
    assert!(high_total > 450, "high {high_total}");
    assert!(low_total < 150, "low {low_total}");
}

#[test]
fn vetoed_challenges_fall_back_to_a_raise() {
    let params = EngineParams {
        call_risk_bias: 1.0,
        ..EngineParams::default()
    };
    let mut engine = DecisionEngine::with_seed(params, 5).with_rules(MexicoRules);
    let state = EngineState {
        bandit: Some(challenge_leaning_bandit()),
        profiles: BTreeMap::from([("opp".to_string(), profile_with_double_bluff(1.0, 50.0))]),
    };
    engine.load_state(&state).unwrap();

    let trace = engine
        .decide_traced("opp", Some(claim("55")), roll(3, 1), 0)
        .unwrap();
    assert_eq!(trace.path, DecisionPath::ChallengeVetoed);
    let Decision::Raise(raised) = trace.decision else {
        panic!("vetoed challenge must raise");
    };
    assert_eq!(MexicoRules.compare(&raised, &claim("55")), Ordering::Greater);
    let scores = trace.scores.expect("bandit scores reported");
    assert_eq!(scores.len(), 2);
    assert!(engine.pending().is_some());
}

#[test]
fn missing_rules_fail_every_grammar_operation() {
    let mut engine = DecisionEngine::new(EngineParams::default());
    assert_eq!(
        engine.decide("opp", Some(claim("43")), roll(5, 5), 0),
        Err(EngineError::RulesNotConfigured)
    );
    assert_eq!(
        engine.observe_raise_size("opp", &claim("43"), &claim("51")),
        Err(EngineError::RulesNotConfigured)
    );
    assert!(engine.profile("opp").is_none());
}

#[test]
fn empty_round_outcome_leaves_the_bandit_alone() {
    let mut engine = DecisionEngine::with_seed(EngineParams::default(), 1).with_rules(MexicoRules);
    let before = engine.state();
    engine.observe_round_outcome(true).unwrap();
    engine.observe_round_outcome(false).unwrap();
    assert_eq!(engine.state(), before);
}

#[test]
fn pending_context_is_rewarded_once() {
    let mut engine = DecisionEngine::with_seed(EngineParams::default(), 8).with_rules(MexicoRules);
    engine
        .decide("opp", Some(claim("66")), roll(3, 1), 4)
        .unwrap();
    assert!(engine.pending().is_some());

    engine.observe_round_outcome(true).unwrap();
    let after_first = engine.state();
    engine.observe_round_outcome(true).unwrap();
    assert_eq!(engine.state(), after_first);
    let untouched = BanditState {
        design: identity(),
        b: [0.0; FEATURE_DIM],
    };
    assert_ne!(after_first.bandit, Some(untouched));
}
