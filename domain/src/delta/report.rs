//! Delta report: a before/after comparison that needs no agent execution.
//!
//! Built from the session's [`PostCallReport`], the deal's confidence
//! baseline, and (when present) the deal's previous session report, which is
//! what "newly unresolved" contradictions are measured against.

use crate::agent::entities::AgentName;
use crate::call::report::{Contradiction, Finding, PostCallReport};
use crate::core::ids::{DealId, SessionId};
use crate::deal::entities::Deal;
use crate::impact::analyzer::ImpactAssessment;
use crate::impact::policy::ImpactPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Direction of a confidence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftDirection {
    Improved,
    Worsened,
    Stable,
}

/// One topic's confidence movement relative to the deal baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicShift {
    pub topic: String,
    /// Baseline confidence, if the deal had one for this topic.
    pub baseline: Option<f64>,
    /// Baseline plus delta, clamped to 0–1 (absent without a baseline).
    pub current: Option<f64>,
    pub delta: f64,
    pub direction: ShiftDirection,
}

/// Structured comparison between a call session and what was known before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub deal_id: DealId,
    pub session_id: SessionId,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: String,
    pub improved: Vec<TopicShift>,
    pub worsened: Vec<TopicShift>,
    pub stable: Vec<TopicShift>,
    /// Contradictions not raised by the previous session.
    pub newly_unresolved: Vec<Contradiction>,
    /// Contradictions the previous session already raised.
    pub recurring: Vec<Contradiction>,
    pub new_information: Vec<Finding>,
    pub remaining_questions: Vec<Finding>,
    /// Agents a targeted re-analysis would run (informational only).
    pub suggested_agents: Vec<AgentName>,
    /// Session the contradictions were compared against, if any.
    pub compared_to_session: Option<SessionId>,
}

impl DeltaReport {
    /// Compare `report` against the deal baseline and the previous session.
    pub fn compare(
        deal: &Deal,
        session_id: SessionId,
        report: &PostCallReport,
        previous: Option<(&SessionId, &PostCallReport)>,
        impact: &ImpactAssessment,
        policy: &ImpactPolicy,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut improved = Vec::new();
        let mut worsened = Vec::new();
        let mut stable = Vec::new();

        for (topic, delta) in &report.confidence_delta {
            let baseline = deal
                .baseline_for(topic)
                .or_else(|| deal.baseline_for(policy.canonical_tag(topic).as_str()));
            let direction = if !policy.is_material(*delta) {
                ShiftDirection::Stable
            } else if *delta > 0.0 {
                ShiftDirection::Improved
            } else {
                ShiftDirection::Worsened
            };
            let shift = TopicShift {
                topic: topic.clone(),
                baseline,
                current: baseline.map(|b| (b + delta).clamp(0.0, 1.0)),
                delta: *delta,
                direction,
            };
            match direction {
                ShiftDirection::Improved => improved.push(shift),
                ShiftDirection::Worsened => worsened.push(shift),
                ShiftDirection::Stable => stable.push(shift),
            }
        }

        // Largest movements first
        let by_magnitude = |a: &TopicShift, b: &TopicShift| {
            b.delta
                .abs()
                .partial_cmp(&a.delta.abs())
                .unwrap_or(Ordering::Equal)
        };
        improved.sort_by(by_magnitude);
        worsened.sort_by(by_magnitude);

        let previous_keys = previous
            .map(|(_, prev)| prev.contradiction_keys())
            .unwrap_or_default();
        let (recurring, newly_unresolved): (Vec<_>, Vec<_>) = report
            .contradictions
            .iter()
            .cloned()
            .partition(|c| previous_keys.contains(&c.key()));

        Self {
            deal_id: deal.id.clone(),
            session_id,
            generated_at,
            executive_summary: report.executive_summary.clone(),
            improved,
            worsened,
            stable,
            newly_unresolved,
            recurring,
            new_information: report.new_information.clone(),
            remaining_questions: report.remaining_questions.clone(),
            suggested_agents: impact.agents.clone(),
            compared_to_session: previous.map(|(id, _)| id.clone()),
        }
    }

    /// Whether anything in this report would justify a targeted re-run.
    pub fn warrants_reanalysis(&self) -> bool {
        !self.suggested_agents.is_empty()
    }
}
