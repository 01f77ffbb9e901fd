//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid identifier for {kind}: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Invalid analysis mode: {0}")]
    InvalidMode(String),

    #[error("Invalid cost for agent {agent}: {cost}")]
    InvalidCost { agent: String, cost: f64 },

    #[error("Duplicate agent in catalog: {0}")]
    DuplicateAgent(String),

    #[error("Invalid agent tier: {0}")]
    InvalidTier(u8),

    #[error("Agent {0} is not part of this analysis run")]
    AgentNotInRun(String),
}

impl DomainError {
    /// Check if this error was caused by malformed caller input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidIdentifier { .. }
                | DomainError::InvalidMode(_)
                | DomainError::InvalidCost { .. }
        )
    }
}
