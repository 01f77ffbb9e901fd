//! Analysis run entity and its state machine.
//!
//! ```text
//! PENDING ──mark_running / first completion──▶ RUNNING ──all agents reported──▶ COMPLETED
//!    │                                            │
//!    └────────────── timeout / mark_failed ───────┴──────────────────────────▶ FAILED
//! ```
//!
//! Transitions are plain methods on [`Analysis`]. Stores apply them inside
//! their own atomic update so concurrent callbacks never interleave on a
//! single record.

use super::result::AgentResult;
use crate::agent::entities::AgentName;
use crate::core::error::DomainError;
use crate::core::ids::{AnalysisId, DealId, SessionId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Summary written when the lazy timeout check fails a run.
pub const TIMEOUT_SUMMARY: &str = "Analysis timed out";

/// Lifecycle status of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Created, job not yet acknowledged
    Pending,
    /// Job acknowledged or first agent reported
    Running,
    /// Every agent reported (successfully or not)
    Completed,
    /// Timed out or could not be dispatched
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "PENDING",
            AnalysisStatus::Running => "RUNNING",
            AnalysisStatus::Completed => "COMPLETED",
            AnalysisStatus::Failed => "FAILED",
        }
    }

    /// PENDING or RUNNING: at most one such run may exist per deal.
    pub fn is_active(&self) -> bool {
        matches!(self, AnalysisStatus::Pending | AnalysisStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Re-analysis mode requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Compare the session against the baseline; no agent runs.
    Delta,
    /// Re-run only the agents impacted by the session.
    Targeted,
    /// Re-run the whole catalog.
    Full,
}

impl AnalysisMode {
    /// Whether this mode creates an analysis run.
    pub fn creates_run(&self) -> bool {
        !matches!(self, AnalysisMode::Delta)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Delta => "delta",
            AnalysisMode::Targeted => "targeted",
            AnalysisMode::Full => "full",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delta" => Ok(AnalysisMode::Delta),
            "targeted" => Ok(AnalysisMode::Targeted),
            "full" => Ok(AnalysisMode::Full),
            _ => Err(DomainError::InvalidMode(s.to_string())),
        }
    }
}

/// Kind of run, derived from whether a call session triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Initial due-diligence run over the deal's documents.
    DueDiligence,
    /// Follow-up run triggered by a call session.
    Reanalysis,
}

/// Result of applying one agent completion to a run.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// First result for this agent; the run is still in progress.
    Progressed {
        completed_agents: usize,
        total_agents: usize,
    },
    /// Redelivery for an agent that already reported; the result was replaced
    /// but the counter did not move.
    Duplicate {
        completed_agents: usize,
        total_agents: usize,
        /// Cost of the result this delivery replaced.
        previous_cost: f64,
    },
    /// This result was the last one missing; the run is now COMPLETED.
    Completed {
        total_agents: usize,
        failed_agents: usize,
        total_cost: f64,
        total_time_ms: u64,
    },
    /// The run was already terminal; the result was dropped.
    Ignored { status: AnalysisStatus },
}

impl CompletionOutcome {
    /// Whether the result was newly counted (first delivery for its agent).
    pub fn is_first_delivery(&self) -> bool {
        matches!(
            self,
            CompletionOutcome::Progressed { .. } | CompletionOutcome::Completed { .. }
        )
    }
}

/// One batch execution of a resolved agent set against a deal (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    id: AnalysisId,
    deal_id: DealId,
    #[serde(rename = "type")]
    analysis_type: AnalysisType,
    mode: AnalysisMode,
    status: AnalysisStatus,
    session_id: Option<SessionId>,
    agents: Vec<AgentName>,
    total_agents: usize,
    completed_agents: usize,
    results: BTreeMap<AgentName, AgentResult>,
    summary: Option<String>,
    total_cost: f64,
    total_time_ms: Option<u64>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Analysis {
    /// Create a PENDING run for the resolved agent set.
    ///
    /// Duplicate agent names are collapsed, keeping first occurrence order.
    pub fn pending(
        deal_id: DealId,
        mode: AnalysisMode,
        session_id: Option<SessionId>,
        agents: Vec<AgentName>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut unique = Vec::with_capacity(agents.len());
        for agent in agents {
            if !unique.contains(&agent) {
                unique.push(agent);
            }
        }
        let analysis_type = if session_id.is_some() {
            AnalysisType::Reanalysis
        } else {
            AnalysisType::DueDiligence
        };

        Self {
            id: AnalysisId::generate(),
            deal_id,
            analysis_type,
            mode,
            status: AnalysisStatus::Pending,
            session_id,
            total_agents: unique.len(),
            agents: unique,
            completed_agents: 0,
            results: BTreeMap::new(),
            summary: None,
            total_cost: 0.0,
            total_time_ms: None,
            started_at: None,
            completed_at: None,
            created_at,
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> AnalysisId {
        self.id
    }

    pub fn deal_id(&self) -> &DealId {
        &self.deal_id
    }

    pub fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn agents(&self) -> &[AgentName] {
        &self.agents
    }

    pub fn total_agents(&self) -> usize {
        self.total_agents
    }

    pub fn completed_agents(&self) -> usize {
        self.completed_agents
    }

    pub fn results(&self) -> &BTreeMap<AgentName, AgentResult> {
        &self.results
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_time_ms(&self) -> Option<u64> {
        self.total_time_ms
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Agents that reported a failure.
    pub fn failed_agents(&self) -> Vec<&AgentName> {
        self.results
            .values()
            .filter(|r| !r.success)
            .map(|r| &r.agent_name)
            .collect()
    }

    /// Agents of the resolved set that have not reported yet.
    pub fn missing_agents(&self) -> Vec<&AgentName> {
        self.agents
            .iter()
            .filter(|a| !self.results.contains_key(*a))
            .collect()
    }

    // ==================== Transitions ====================

    /// PENDING → RUNNING. Returns `false` if the run was not pending.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != AnalysisStatus::Pending {
            return false;
        }
        self.status = AnalysisStatus::Running;
        self.started_at = Some(now);
        true
    }

    /// Fail an active run. Returns `false` if the run was already terminal.
    pub fn mark_failed(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = AnalysisStatus::Failed;
        self.summary = Some(reason.into());
        self.finish_timing(now);
        true
    }

    /// Lazy timeout: fail an active run older than `timeout`.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>, timeout: Duration) -> bool {
        if self.status.is_active() && now - self.created_at > timeout {
            return self.mark_failed(TIMEOUT_SUMMARY, now);
        }
        false
    }

    /// Merge one agent result into the run.
    ///
    /// - The first result per agent increments `completed_agents`; later
    ///   deliveries replace the stored result without counting again.
    /// - `total_cost` is recomputed from stored results.
    /// - When every agent has reported the run becomes COMPLETED, whether or
    ///   not individual agents succeeded.
    pub fn apply_completion(
        &mut self,
        result: AgentResult,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, DomainError> {
        if self.status.is_terminal() {
            return Ok(CompletionOutcome::Ignored {
                status: self.status,
            });
        }
        if !self.agents.contains(&result.agent_name) {
            return Err(DomainError::AgentNotInRun(result.agent_name.to_string()));
        }
        if !result.has_valid_cost() {
            return Err(DomainError::InvalidCost {
                agent: result.agent_name.to_string(),
                cost: result.cost,
            });
        }

        self.mark_running(now);

        let replaced = self.results.insert(result.agent_name.clone(), result);
        let first_delivery = replaced.is_none();
        if first_delivery && self.completed_agents < self.total_agents {
            self.completed_agents += 1;
        }
        self.total_cost = self.results.values().map(|r| r.cost).sum();

        if let Some(previous) = replaced {
            return Ok(CompletionOutcome::Duplicate {
                completed_agents: self.completed_agents,
                total_agents: self.total_agents,
                previous_cost: previous.cost,
            });
        }

        if self.completed_agents == self.total_agents {
            let failed = self.failed_agents().len();
            self.status = AnalysisStatus::Completed;
            self.summary = Some(format!(
                "{} of {} agents succeeded",
                self.total_agents - failed,
                self.total_agents
            ));
            self.finish_timing(now);
            return Ok(CompletionOutcome::Completed {
                total_agents: self.total_agents,
                failed_agents: failed,
                total_cost: self.total_cost,
                total_time_ms: self.total_time_ms.unwrap_or_default(),
            });
        }

        Ok(CompletionOutcome::Progressed {
            completed_agents: self.completed_agents,
            total_agents: self.total_agents,
        })
    }

    fn finish_timing(&mut self, now: DateTime<Utc>) {
        let start = self.started_at.unwrap_or(self.created_at);
        self.completed_at = Some(now);
        self.total_time_ms = Some((now - start).num_milliseconds().max(0) as u64);
    }
}
