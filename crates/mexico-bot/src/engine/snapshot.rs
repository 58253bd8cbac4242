//! Serializable shape of everything the engine has learned.

use super::EngineError;
use crate::bandit::{DesignMatrix, FeatureVector, LinUcb};
use crate::belief::{OpponentProfile, ProbabilityTracker};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandit: Option<BanditState>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditState {
    #[serde(rename = "A")]
    pub design: DesignMatrix,
    pub b: FeatureVector,
}

/// Tracker counts stored as `(alpha, beta)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileState {
    pub bluff_rate: BTreeMap<String, (f64, f64)>,
    pub call_rate: (f64, f64),
    pub small_raise_pref: (f64, f64),
}

impl EngineState {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl BanditState {
    pub fn capture(bandit: &LinUcb) -> Self {
        Self {
            design: *bandit.design(),
            b: *bandit.rewards(),
        }
    }

    pub fn restore(&self, exploration: f64) -> Result<LinUcb, EngineError> {
        Ok(LinUcb::from_parts(exploration, self.design, self.b)?)
    }
}

impl ProfileState {
    pub fn capture(profile: &OpponentProfile) -> Self {
        Self {
            bluff_rate: profile
                .bluff_rates()
                .map(|(category, tracker)| (category.to_string(), tracker.counts()))
                .collect(),
            call_rate: profile.call_rate().counts(),
            small_raise_pref: profile.small_raise_pref().counts(),
        }
    }

    /// Rebuilds the profile; categories not listed stay absent until first use.
    pub fn restore(&self, opponent_id: &str) -> Result<OpponentProfile, EngineError> {
        let mut bluff_rate = BTreeMap::new();
        for (category, &counts) in &self.bluff_rate {
            let field = format!("profiles.{opponent_id}.bluff_rate.{category}");
            bluff_rate.insert(category.clone(), tracker_from(&field, counts)?);
        }
        let call_rate = tracker_from(
            &format!("profiles.{opponent_id}.call_rate"),
            self.call_rate,
        )?;
        let small_raise_pref = tracker_from(
            &format!("profiles.{opponent_id}.small_raise_pref"),
            self.small_raise_pref,
        )?;
        Ok(OpponentProfile::from_parts(
            bluff_rate,
            call_rate,
            small_raise_pref,
        ))
    }
}

fn tracker_from(field: &str, (alpha, beta): (f64, f64)) -> Result<ProbabilityTracker, EngineError> {
    ProbabilityTracker::from_counts(alpha, beta).ok_or_else(|| {
        EngineError::invalid_state(
            field,
            format!("counts must be positive and finite, got [{alpha}, {beta}]"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_uses_documented_keys() {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "alice".to_string(),
            ProfileState::capture(&OpponentProfile::default()),
        );
        let state = EngineState {
            bandit: Some(BanditState::capture(&LinUcb::default())),
            profiles,
        };
        let json = state.to_json().unwrap();
        assert!(json.contains("\"A\""));
        assert!(json.contains("\"b\""));
        assert!(json.contains("\"bluff_rate\""));
        assert!(json.contains("\"call_rate\""));
        assert!(json.contains("\"small_raise_pref\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["profiles"]["alice"]["call_rate"], serde_json::json!([1.0, 2.0]));
        assert_eq!(value["bandit"]["A"].as_array().unwrap().len(), 9);
        assert_eq!(value["bandit"]["b"].as_array().unwrap().len(), 9);
        assert_eq!(EngineState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn bandit_section_is_optional() {
        let state = EngineState::from_json(r#"{ "profiles": {} }"#).unwrap();
        assert!(state.bandit.is_none());
        assert!(state.profiles.is_empty());
    }

    #[test]
    fn restore_names_the_bad_field() {
        let state = ProfileState {
            bluff_rate: BTreeMap::from([("double".to_string(), (0.0, 1.0))]),
            call_rate: (1.0, 2.0),
            small_raise_pref: (1.0, 1.0),
        };
        match state.restore("bob") {
            Err(EngineError::InvalidState { field, .. }) => {
                assert_eq!(field, "profiles.bob.bluff_rate.double");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn restore_keeps_only_listed_categories() {
        let state = ProfileState {
            bluff_rate: BTreeMap::from([("double".to_string(), (2.0, 10.0))]),
            call_rate: (3.0, 2.0),
            small_raise_pref: (1.0, 4.0),
        };
        let profile = state.restore("carol").unwrap();
        assert_eq!(profile.bluff_rates().count(), 1);
        assert!(profile.bluff_rate("mexican").is_none());
        assert_eq!(profile.call_rate().counts(), (3.0, 2.0));
        assert_eq!(ProfileState::capture(&profile), state);
    }
}
