#![deny(warnings)]

pub mod model;
pub mod rules;

pub use model::claim::{Claim, ParseClaimError};
pub use model::roll::Roll;
pub use rules::{ClaimRules, MexicoRules, RuleSet, RuleSetBuilder, RulesError};
