use super::ProbabilityTracker;
use mexico_core::model::{DOUBLE, MEXICAN, NORMAL};
use std::collections::BTreeMap;

const MEXICAN_BLUFF_PRIOR: ProbabilityTracker = ProbabilityTracker::new(1.0, 3.0);
const DOUBLE_BLUFF_PRIOR: ProbabilityTracker = ProbabilityTracker::new(1.0, 2.0);
const NORMAL_BLUFF_PRIOR: ProbabilityTracker = ProbabilityTracker::new(1.0, 1.0);
const CALL_RATE_PRIOR: ProbabilityTracker = ProbabilityTracker::new(1.0, 2.0);
const SMALL_RAISE_PRIOR: ProbabilityTracker = ProbabilityTracker::new(1.0, 1.0);

/// What the engine has learned about one opponent.
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentProfile {
    bluff_rate: BTreeMap<String, ProbabilityTracker>,
    call_rate: ProbabilityTracker,
    small_raise_pref: ProbabilityTracker,
}

impl OpponentProfile {
    /// A profile with no bluff categories at all; they appear on first use.
    pub fn empty() -> Self {
        Self {
            bluff_rate: BTreeMap::new(),
            call_rate: CALL_RATE_PRIOR,
            small_raise_pref: SMALL_RAISE_PRIOR,
        }
    }

    pub fn bluff_rate(&self, category: &str) -> Option<&ProbabilityTracker> {
        self.bluff_rate.get(category)
    }

    /// Bluff tracker for `category`, created with a uniform prior when unseen.
    pub fn bluff_rate_mut(&mut self, category: &str) -> &mut ProbabilityTracker {
        self.bluff_rate
            .entry(category.to_string())
            .or_insert(ProbabilityTracker::UNIFORM)
    }

    pub fn bluff_rates(&self) -> impl Iterator<Item = (&str, &ProbabilityTracker)> {
        self.bluff_rate
            .iter()
            .map(|(category, tracker)| (category.as_str(), tracker))
    }

    pub fn call_rate(&self) -> &ProbabilityTracker {
        &self.call_rate
    }

    pub fn call_rate_mut(&mut self) -> &mut ProbabilityTracker {
        &mut self.call_rate
    }

    pub fn small_raise_pref(&self) -> &ProbabilityTracker {
        &self.small_raise_pref
    }

    pub fn small_raise_pref_mut(&mut self) -> &mut ProbabilityTracker {
        &mut self.small_raise_pref
    }

    pub(crate) fn from_parts(
        bluff_rate: BTreeMap<String, ProbabilityTracker>,
        call_rate: ProbabilityTracker,
        small_raise_pref: ProbabilityTracker,
    ) -> Self {
        Self {
            bluff_rate,
            call_rate,
            small_raise_pref,
        }
    }
}

impl Default for OpponentProfile {
    fn default() -> Self {
        let mut profile = Self::empty();
        profile
            .bluff_rate
            .insert(MEXICAN.to_string(), MEXICAN_BLUFF_PRIOR);
        profile
            .bluff_rate
            .insert(DOUBLE.to_string(), DOUBLE_BLUFF_PRIOR);
        profile
            .bluff_rate
            .insert(NORMAL.to_string(), NORMAL_BLUFF_PRIOR);
        profile
    }
}
