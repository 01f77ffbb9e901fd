//! Cost ledger entities and aggregations.
//!
//! The ledger is append-only. Aggregates are always recomputed by summing
//! events, so concurrent writers can never overwrite each other's costs.

use crate::agent::entities::AgentName;
use crate::core::error::DomainError;
use crate::core::ids::{AnalysisId, DealId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One agent execution's cost (immutable once appended).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEvent {
    pub analysis_id: AnalysisId,
    pub deal_id: DealId,
    pub user_id: UserId,
    pub agent_name: AgentName,
    /// Cost in USD. Negative only for adjustments.
    pub cost: f64,
    pub recorded_at: DateTime<Utc>,
    /// Correction appended when a redelivered result changed an agent's
    /// cost. Not an extra agent call.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub adjustment: bool,
}

impl CostEvent {
    pub fn new(
        analysis_id: AnalysisId,
        deal_id: DealId,
        user_id: UserId,
        agent_name: AgentName,
        cost: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(DomainError::InvalidCost {
                agent: agent_name.to_string(),
                cost,
            });
        }
        Ok(Self {
            analysis_id,
            deal_id,
            user_id,
            agent_name,
            cost,
            recorded_at,
            adjustment: false,
        })
    }

    /// Correction of a previously recorded cost by `delta` (may be negative).
    pub fn adjustment(
        analysis_id: AnalysisId,
        deal_id: DealId,
        user_id: UserId,
        agent_name: AgentName,
        delta: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !delta.is_finite() {
            return Err(DomainError::InvalidCost {
                agent: agent_name.to_string(),
                cost: delta,
            });
        }
        Ok(Self {
            analysis_id,
            deal_id,
            user_id,
            agent_name,
            cost: delta,
            recorded_at,
            adjustment: true,
        })
    }
}

/// Calls and cost attributed to one agent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentCostTotals {
    pub calls: usize,
    pub cost: f64,
}

/// Aggregate cost view for one deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealCostSummary {
    pub deal_id: DealId,
    pub total_cost: f64,
    pub event_count: usize,
    pub by_agent: BTreeMap<AgentName, AgentCostTotals>,
    pub by_analysis: BTreeMap<AnalysisId, f64>,
}

impl DealCostSummary {
    /// Aggregate the events belonging to `deal_id`; other deals are skipped.
    pub fn from_events<'a>(deal_id: &DealId, events: impl IntoIterator<Item = &'a CostEvent>) -> Self {
        let mut summary = Self {
            deal_id: deal_id.clone(),
            total_cost: 0.0,
            event_count: 0,
            by_agent: BTreeMap::new(),
            by_analysis: BTreeMap::new(),
        };

        for event in events.into_iter().filter(|e| &e.deal_id == deal_id) {
            summary.total_cost += event.cost;
            summary.event_count += 1;
            let agent = summary.by_agent.entry(event.agent_name.clone()).or_default();
            if !event.adjustment {
                agent.calls += 1;
            }
            agent.cost += event.cost;
            *summary.by_analysis.entry(event.analysis_id).or_default() += event.cost;
        }

        summary
    }
}

/// Usage statistics for one user over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCostStats {
    pub user_id: UserId,
    pub window_days: u32,
    pub total_cost: f64,
    /// Credits consumed: cost converted at the configured rate, rounded up.
    pub credits: u64,
    pub agent_calls: usize,
    pub analyses: usize,
    pub deals: usize,
}

impl UserCostStats {
    /// Aggregate the user's events recorded at or after `since`.
    pub fn from_events<'a>(
        user_id: &UserId,
        window_days: u32,
        since: DateTime<Utc>,
        credits_per_usd: f64,
        events: impl IntoIterator<Item = &'a CostEvent>,
    ) -> Self {
        let mut total_cost = 0.0;
        let mut agent_calls = 0;
        let mut analyses = BTreeSet::new();
        let mut deals = BTreeSet::new();

        for event in events
            .into_iter()
            .filter(|e| &e.user_id == user_id && e.recorded_at >= since)
        {
            total_cost += event.cost;
            if !event.adjustment {
                agent_calls += 1;
            }
            analyses.insert(event.analysis_id);
            deals.insert(event.deal_id.clone());
        }

        Self {
            user_id: user_id.clone(),
            window_days,
            total_cost,
            credits: (total_cost * credits_per_usd).ceil().max(0.0) as u64,
            agent_calls,
            analyses: analyses.len(),
            deals: deals.len(),
        }
    }
}
