//! Claim grammar consumed by decision engines.
//!
//! - `ClaimRules`: the four functions an engine needs to reason about claims.
//! - `RuleSet`: adapter assembling those functions from closures.
//! - `MexicoRules`: the standard Mexico ordering.

mod mexico;

pub use mexico::MexicoRules;

use crate::model::claim::Claim;
use crate::model::roll::Roll;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Total order, successor, bucketing and truth test over claims.
pub trait ClaimRules {
    /// Orders two claims by strength.
    fn compare(&self, a: &Claim, b: &Claim) -> Ordering;

    /// The weakest claim strictly above `claim`.
    fn next_higher(&self, claim: &Claim) -> Claim;

    /// Bluff bucket for a claim (for example `"double"`).
    fn categorize(&self, claim: &Claim) -> String;

    /// Whether `roll` backs up `claim`.
    fn matches_roll(&self, claim: &Claim, roll: &Roll) -> bool;
}

type CompareFn = dyn Fn(&Claim, &Claim) -> Ordering + Send + Sync;
type NextHigherFn = dyn Fn(&Claim) -> Claim + Send + Sync;
type CategorizeFn = dyn Fn(&Claim) -> String + Send + Sync;
type MatchesRollFn = dyn Fn(&Claim, &Roll) -> bool + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("claim rule `{rule}` was not provided")]
    Missing { rule: &'static str },
}

/// Claim rules assembled from individually supplied functions.
pub struct RuleSet {
    compare: Box<CompareFn>,
    next_higher: Box<NextHigherFn>,
    categorize: Box<CategorizeFn>,
    matches_roll: Box<MatchesRollFn>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }
}

impl ClaimRules for RuleSet {
    fn compare(&self, a: &Claim, b: &Claim) -> Ordering {
        (self.compare)(a, b)
    }

    fn next_higher(&self, claim: &Claim) -> Claim {
        (self.next_higher)(claim)
    }

    fn categorize(&self, claim: &Claim) -> String {
        (self.categorize)(claim)
    }

    fn matches_roll(&self, claim: &Claim, roll: &Roll) -> bool {
        (self.matches_roll)(claim, roll)
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RuleSetBuilder {
    compare: Option<Box<CompareFn>>,
    next_higher: Option<Box<NextHigherFn>>,
    categorize: Option<Box<CategorizeFn>>,
    matches_roll: Option<Box<MatchesRollFn>>,
}

impl RuleSetBuilder {
    pub fn compare<F>(mut self, f: F) -> Self
    where
        F: Fn(&Claim, &Claim) -> Ordering + Send + Sync + 'static,
    {
        self.compare = Some(Box::new(f));
        self
    }

    pub fn next_higher<F>(mut self, f: F) -> Self
    where
        F: Fn(&Claim) -> Claim + Send + Sync + 'static,
    {
        self.next_higher = Some(Box::new(f));
        self
    }

    pub fn categorize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Claim) -> String + Send + Sync + 'static,
    {
        self.categorize = Some(Box::new(f));
        self
    }

    pub fn matches_roll<F>(mut self, f: F) -> Self
    where
        F: Fn(&Claim, &Roll) -> bool + Send + Sync + 'static,
    {
        self.matches_roll = Some(Box::new(f));
        self
    }

    /// Fails on the first function left unset.
    pub fn build(self) -> Result<RuleSet, RulesError> {
        Ok(RuleSet {
            compare: self.compare.ok_or(RulesError::Missing { rule: "compare" })?,
            next_higher: self
                .next_higher
                .ok_or(RulesError::Missing { rule: "next_higher" })?,
            categorize: self
                .categorize
                .ok_or(RulesError::Missing { rule: "categorize" })?,
            matches_roll: self
                .matches_roll
                .ok_or(RulesError::Missing { rule: "matches_roll" })?,
        })
    }
}
