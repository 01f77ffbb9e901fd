//! Poll Analysis use case
//!
//! Caller-facing view of a deal's latest run. Reading an overdue run fails
//! it (lazy timeout), and per-agent results are only exposed once the run
//! has COMPLETED.

use crate::error::OrchestrationError;
use crate::ports::records::DealRepository;
use crate::use_cases::analysis_runs::AnalysisRunService;
use chrono::{DateTime, Utc};
use diligence_domain::{
    AgentName, AgentResult, Analysis, AnalysisId, AnalysisMode, AnalysisStatus, AnalysisType,
    DealId, SessionId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTimings {
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_time_ms: Option<u64>,
}

/// Snapshot of one run as shown to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisStatusView {
    pub analysis_id: AnalysisId,
    pub deal_id: DealId,
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    pub mode: AnalysisMode,
    pub status: AnalysisStatus,
    pub session_id: Option<SessionId>,
    pub completed_agents: usize,
    pub total_agents: usize,
    /// Present only for COMPLETED runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<BTreeMap<AgentName, AgentResult>>,
    pub failed_agents: Vec<AgentName>,
    pub summary: Option<String>,
    pub total_cost: f64,
    pub timings: RunTimings,
}

impl From<&Analysis> for AnalysisStatusView {
    fn from(analysis: &Analysis) -> Self {
        let completed = analysis.status() == AnalysisStatus::Completed;
        Self {
            analysis_id: analysis.id(),
            deal_id: analysis.deal_id().clone(),
            analysis_type: analysis.analysis_type(),
            mode: analysis.mode(),
            status: analysis.status(),
            session_id: analysis.session_id().cloned(),
            completed_agents: analysis.completed_agents(),
            total_agents: analysis.total_agents(),
            results: completed.then(|| analysis.results().clone()),
            failed_agents: analysis.failed_agents().into_iter().cloned().collect(),
            summary: analysis.summary().map(str::to_string),
            total_cost: analysis.total_cost(),
            timings: RunTimings {
                created_at: analysis.created_at(),
                started_at: analysis.started_at(),
                completed_at: analysis.completed_at(),
                total_time_ms: analysis.total_time_ms(),
            },
        }
    }
}

impl AnalysisStatusView {
    pub fn progress_percent(&self) -> u8 {
        if self.total_agents == 0 {
            return 0;
        }
        ((self.completed_agents * 100) / self.total_agents).min(100) as u8
    }
}

/// Use case for reading run status
pub struct PollAnalysisUseCase {
    deals: Arc<dyn DealRepository>,
    runs: Arc<AnalysisRunService>,
}

impl PollAnalysisUseCase {
    pub fn new(deals: Arc<dyn DealRepository>, runs: Arc<AnalysisRunService>) -> Self {
        Self { deals, runs }
    }

    /// Latest run for `deal_id`.
    pub async fn latest_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<AnalysisStatusView, OrchestrationError> {
        if self.deals.get_deal(deal_id).await?.is_none() {
            return Err(OrchestrationError::not_found("Deal", deal_id));
        }
        let analysis = self
            .runs
            .latest_for_deal(deal_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("Analysis", format!("deal {}", deal_id)))?;
        Ok(AnalysisStatusView::from(&analysis))
    }

    pub async fn by_id(&self, analysis_id: AnalysisId) -> Result<AnalysisStatusView, OrchestrationError> {
        let analysis = self.runs.get(analysis_id).await?;
        Ok(AnalysisStatusView::from(&analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;
    use crate::use_cases::analysis_runs::tests::run_service;
    use chrono::Duration;

    fn setup(fixture: &Fixture) -> (PollAnalysisUseCase, Arc<AnalysisRunService>) {
        let runs = Arc::new(run_service(fixture));
        (PollAnalysisUseCase::new(fixture.store.clone(), runs.clone()), runs)
    }

    #[tokio::test]
    async fn test_results_hidden_until_completed() {
        let fixture = Fixture::new();
        let (poll, runs) = setup(&fixture);
        let run = runs
            .create_run(
                &fixture.deal_id(),
                vec![AgentName::new("a"), AgentName::new("b")],
                AnalysisMode::Full,
                None,
            )
            .await
            .unwrap();

        runs.record_agent_completion(run.id(), AgentResult::success("a", 5, 0.1))
            .await
            .unwrap();
        let view = poll.latest_for_deal(&fixture.deal_id()).await.unwrap();
        assert_eq!(view.status, AnalysisStatus::Running);
        assert_eq!(view.completed_agents, 1);
        assert_eq!(view.progress_percent(), 50);
        assert!(view.results.is_none());

        runs.record_agent_completion(run.id(), AgentResult::success("b", 5, 0.2))
            .await
            .unwrap();
        let view = poll.by_id(run.id()).await.unwrap();
        assert_eq!(view.status, AnalysisStatus::Completed);
        assert_eq!(view.results.as_ref().map(BTreeMap::len), Some(2));
        assert!(view.timings.total_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_poll_applies_timeout() {
        let fixture = Fixture::new();
        let (poll, runs) = setup(&fixture);
        runs.create_run(&fixture.deal_id(), vec![AgentName::new("a")], AnalysisMode::Full, None)
            .await
            .unwrap();
        fixture.clock.advance(Duration::minutes(31));

        let view = poll.latest_for_deal(&fixture.deal_id()).await.unwrap();
        assert_eq!(view.status, AnalysisStatus::Failed);
        assert!(view.results.is_none());
    }

    #[tokio::test]
    async fn test_deal_without_runs_is_not_found() {
        let fixture = Fixture::new();
        let (poll, _) = setup(&fixture);
        let err = poll.latest_for_deal(&fixture.deal_id()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = poll.latest_for_deal(&DealId::new("ghost")).await.unwrap_err();
        assert_eq!(err.to_string(), "Deal not found: ghost");
    }

    #[test]
    fn test_view_serializes_type_field() {
        let analysis = Analysis::pending(
            DealId::new("d"),
            AnalysisMode::Targeted,
            Some(SessionId::new("s")),
            vec![AgentName::new("a")],
            Utc::now(),
        );
        let json = serde_json::to_value(AnalysisStatusView::from(&analysis)).unwrap();
        assert_eq!(json["type"], "reanalysis");
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("results").is_none());
    }
}
