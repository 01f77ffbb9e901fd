//! Orchestrator parameters: run lifecycle and batch execution control.
//!
//! [`OrchestratorParams`] groups the static parameters used by the run
//! service (timeout) and by the batch executor (parallelism, per-agent
//! timeout). These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Run lifecycle and batch execution parameters.
///
/// | Parameter | Used by |
/// |-----------|---------|
/// | `run_timeout` | lazy timeout check on reads |
/// | `agent_timeout` | batch executor, per agent |
/// | `max_parallel_agents` | batch executor |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorParams {
    /// Age after which an active run is considered stuck and failed on read.
    pub run_timeout: Duration,
    /// Maximum time a single agent may run before it is reported as failed.
    pub agent_timeout: Duration,
    /// Maximum agents executed concurrently within one batch.
    pub max_parallel_agents: usize,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(30 * 60),
            agent_timeout: Duration::from_secs(5 * 60),
            max_parallel_agents: 6,
        }
    }
}

impl OrchestratorParams {
    // ==================== Builder Methods ====================

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_max_parallel_agents(mut self, max: usize) -> Self {
        self.max_parallel_agents = max.max(1);
        self
    }

    /// Run timeout as a `chrono` duration for timestamp arithmetic.
    pub fn run_timeout_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.run_timeout).unwrap_or(chrono::Duration::MAX)
    }
}
