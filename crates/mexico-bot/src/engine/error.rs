use crate::bandit::BanditError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("claim rules must be installed before the engine can reason about claims")]
    RulesNotConfigured,
    #[error("bandit failure: {0}")]
    Bandit(#[from] BanditError),
    #[error("invalid engine state at {field}: {message}")]
    InvalidState { field: String, message: String },
}

impl EngineError {
    pub(crate) fn invalid_state(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidState {
            field: field.into(),
            message: message.into(),
        }
    }
}
