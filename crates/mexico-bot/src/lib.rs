#![deny(warnings)]
pub mod bandit;
pub mod belief;
pub mod engine;

pub use bandit::{Action, ArmScore, BanditChoice, BanditError, LinUcb};
pub use belief::{OpponentProfile, ProbabilityTracker};
pub use engine::{
    Decision, DecisionEngine, DecisionPath, DecisionTrace, EngineError, EngineParams, EngineState,
    PendingContext,
};
