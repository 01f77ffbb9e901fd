//! Application error taxonomy
//!
//! Every rejected request maps to one variant. Validation, not-found,
//! conflict and precondition errors are raised before any side effect.
//! Per-agent failures never surface here; they are recorded as failed
//! [`AgentResult`](diligence_domain::AgentResult)s instead.

use crate::ports::analysis_store::StoreError;
use crate::ports::job_transport::TransportError;
use diligence_domain::{AnalysisId, DealId, DomainError};
use thiserror::Error;

/// Errors returned by orchestration use cases
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Deal {deal_id} already has an active analysis ({analysis_id})")]
    Conflict {
        deal_id: DealId,
        analysis_id: AnalysisId,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl OrchestrationError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OrchestrationError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// HTTP-style status code for the caller-facing surface.
    pub fn status_code(&self) -> u16 {
        match self {
            OrchestrationError::Validation(_) => 400,
            OrchestrationError::NotFound { .. } => 404,
            OrchestrationError::Conflict { .. } => 409,
            OrchestrationError::Precondition(_) => 412,
            OrchestrationError::RateLimited { .. } => 429,
            OrchestrationError::Store(_) => 500,
            OrchestrationError::Transport(_) => 503,
        }
    }

    /// Whether the caller caused the error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<DomainError> for OrchestrationError {
    fn from(e: DomainError) -> Self {
        OrchestrationError::Validation(e.to_string())
    }
}

impl From<StoreError> for OrchestrationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ActiveRunExists {
                deal_id,
                analysis_id,
            } => OrchestrationError::Conflict {
                deal_id,
                analysis_id,
            },
            StoreError::AnalysisNotFound(id) => OrchestrationError::not_found("Analysis", id),
            StoreError::Rejected(domain) => OrchestrationError::Validation(domain.to_string()),
            StoreError::Backend(message) => OrchestrationError::Store(message),
        }
    }
}
