//! Per-opponent Bayesian tendencies.
//!
//! - `tracker`: Beta-Bernoulli estimator for a single probability.
//! - `profile`: the trackers kept for one opponent (bluffing per claim
//!   category, calling our raises, raising by the minimum step).

mod profile;
mod tracker;

pub use profile::OpponentProfile;
pub use tracker::ProbabilityTracker;
