//! Agent executor port
//!
//! Runs a single agent against a deal inside the job runtime. Prompting and
//! model access live behind this port; the orchestrator only sees the
//! envelope it returns.

use async_trait::async_trait;
use diligence_domain::{AgentName, AnalysisId, DealId, SessionId};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while executing one agent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Agent failed: {0}")]
    Failed(String),

    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Agent timed out after {0}s")]
    Timeout(u64),
}

/// What to run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentInvocation {
    pub analysis_id: AnalysisId,
    pub deal_id: DealId,
    pub agent: AgentName,
    pub session_id: Option<SessionId>,
}

/// Successful agent output.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    /// Cost in USD.
    pub cost: f64,
    pub data: Option<Value>,
}

impl AgentOutput {
    pub fn new(cost: f64) -> Self {
        Self { cost, data: None }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(&self, invocation: &AgentInvocation) -> Result<AgentOutput, ExecutorError>;
}
