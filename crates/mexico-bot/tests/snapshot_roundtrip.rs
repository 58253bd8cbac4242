use std::collections::BTreeMap;

use mexico_bot::bandit::{BanditError, FEATURE_DIM};
use mexico_bot::engine::{BanditState, ProfileState};
use mexico_bot::{DecisionEngine, EngineError, EngineParams, EngineState};
use mexico_core::{Claim, MexicoRules, Roll};

fn claim(text: &str) -> Claim {
    text.parse().unwrap()
}

fn roll(a: u8, b: u8) -> Roll {
    Roll::new(a, b).unwrap()
}

/// Engine that has played a few rounds against two opponents.
fn trained_engine() -> DecisionEngine {
    let mut engine = DecisionEngine::with_seed(EngineParams::default(), 21).with_rules(MexicoRules);
    for round in 0..12u32 {
        let opponent = if round % 2 == 0 { "alice" } else { "bob" };
        engine
            .decide(opponent, Some(claim("61")), roll(3, 1), round)
            .unwrap();
        engine
            .observe_showdown(opponent, &claim("44"), roll(5, 2), true)
            .unwrap();
        engine.observe_raise_resolved(opponent, &claim("62"), roll(1, 2), round % 3 == 0);
        engine
            .observe_raise_size(opponent, &claim("62"), &claim("64"))
            .unwrap();
        engine.observe_round_outcome(round % 4 != 0).unwrap();
    }
    engine
}

#[test]
fn save_load_save_reproduces_the_state() {
    let engine = trained_engine();
    let saved = engine.state();
    let json = saved.to_json().unwrap();

    let mut restored = DecisionEngine::with_seed(EngineParams::default(), 0).with_rules(MexicoRules);
    restored
        .load_state(&EngineState::from_json(&json).unwrap())
        .unwrap();

    assert_eq!(restored.state(), saved);
    assert_eq!(restored.state().to_json().unwrap(), json);
    assert!(restored.pending().is_none());
}

#[test]
fn profiles_missing_from_the_state_are_kept() {
    let mut engine = trained_engine();
    let carol = ProfileState {
        bluff_rate: BTreeMap::from([("normal".to_string(), (4.0, 2.0))]),
        call_rate: (2.0, 2.0),
        small_raise_pref: (3.0, 1.0),
    };
    let state = EngineState {
        bandit: None,
        profiles: BTreeMap::from([("carol".to_string(), carol.clone())]),
    };
    let bandit_before = engine.bandit().clone();

    engine.load_state(&state).unwrap();

    assert!(engine.profile("alice").is_some());
    assert!(engine.profile("bob").is_some());
    assert_eq!(engine.bandit(), &bandit_before);
    let loaded = engine.state();
    assert_eq!(loaded.profiles["carol"], carol);
}

#[test]
fn corrupted_bandit_is_rejected_without_side_effects() {
    let mut engine = trained_engine();
    let before = engine.state();

    let mut corrupted = before.clone();
    let bandit = corrupted.bandit.as_mut().unwrap();
    bandit.design[0][0] = -1.0;

    assert_eq!(
        engine.load_state(&corrupted),
        Err(EngineError::Bandit(BanditError::NotPositiveDefinite {
            pivot: 0
        }))
    );
    assert_eq!(engine.state(), before);
}

#[test]
fn asymmetric_and_non_finite_bandits_are_rejected() {
    let mut engine = DecisionEngine::with_seed(EngineParams::default(), 0).with_rules(MexicoRules);
    let mut design = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    for (i, row) in design.iter_mut().enumerate() {
        row[i] = 2.0;
    }
    design[0][1] = 0.5;

    let asymmetric = EngineState {
        bandit: Some(BanditState {
            design,
            b: [0.0; FEATURE_DIM],
        }),
        profiles: BTreeMap::new(),
    };
    assert_eq!(
        engine.load_state(&asymmetric),
        Err(EngineError::Bandit(BanditError::Asymmetric))
    );

    design[0][1] = 0.0;
    let mut b = [0.0; FEATURE_DIM];
    b[3] = f64::NAN;
    let non_finite = EngineState {
        bandit: Some(BanditState { design, b }),
        profiles: BTreeMap::new(),
    };
    assert!(matches!(
        engine.load_state(&non_finite),
        Err(EngineError::Bandit(BanditError::NonFinite { .. }))
    ));
}

#[test]
fn bad_profile_counts_reject_the_whole_state() {
    let mut engine = trained_engine();
    let before = engine.state();

    let mut state = before.clone();
    state.bandit = None;
    state.profiles.get_mut("bob").unwrap().call_rate = (f64::INFINITY, 1.0);

    match engine.load_state(&state) {
        Err(EngineError::InvalidState { field, .. }) => {
            assert_eq!(field, "profiles.bob.call_rate");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(engine.state(), before);
}
