//! Dispatch Analysis use case
//!
//! Resolves the agent set for a `targeted` or `full` request, creates the
//! run (subject to the single-active-run guard) and hands the batch to the
//! job transport. Nothing is created when resolution fails.

use crate::error::OrchestrationError;
use crate::ports::job_transport::{AnalysisJob, JobTransport};
use crate::ports::notifier::{Alert, AlertNotifier, AlertSeverity};
use crate::ports::records::{DealRepository, SessionSummaryRepository};
use crate::ports::run_event_logger::{RunEvent, RunEventLogger};
use crate::use_cases::analysis_runs::AnalysisRunService;
use diligence_domain::{
    AgentName, AgentRegistry, AnalysisId, AnalysisMode, DealId, ImpactAnalyzer, ImpactAssessment,
    ImpactPolicy, SessionId, SessionSummary,
};
use std::sync::Arc;
use tracing::{error, info};

/// Input for the DispatchAnalysis use case
#[derive(Debug, Clone)]
pub struct DispatchInput {
    pub deal_id: DealId,
    pub mode: AnalysisMode,
    /// Session that triggered the run. `targeted` reads this session's
    /// summary (or the deal's latest one when absent).
    pub session_id: Option<SessionId>,
}

impl DispatchInput {
    pub fn new(deal_id: DealId, mode: AnalysisMode) -> Self {
        Self {
            deal_id,
            mode,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Accepted dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutput {
    pub analysis_id: AnalysisId,
    pub agents: Vec<AgentName>,
    /// Impact reasoning for `targeted` runs.
    pub assessment: Option<ImpactAssessment>,
}

/// Use case for starting an agent batch
pub struct DispatchAnalysisUseCase {
    registry: Arc<AgentRegistry>,
    policy: Arc<ImpactPolicy>,
    deals: Arc<dyn DealRepository>,
    sessions: Arc<dyn SessionSummaryRepository>,
    runs: Arc<AnalysisRunService>,
    transport: Arc<dyn JobTransport>,
    events: Arc<dyn RunEventLogger>,
    alerts: Arc<dyn AlertNotifier>,
}

impl DispatchAnalysisUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<AgentRegistry>,
        policy: Arc<ImpactPolicy>,
        deals: Arc<dyn DealRepository>,
        sessions: Arc<dyn SessionSummaryRepository>,
        runs: Arc<AnalysisRunService>,
        transport: Arc<dyn JobTransport>,
        events: Arc<dyn RunEventLogger>,
        alerts: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            registry,
            policy,
            deals,
            sessions,
            runs,
            transport,
            events,
            alerts,
        }
    }

    pub async fn execute(&self, input: DispatchInput) -> Result<DispatchOutput, OrchestrationError> {
        if !input.mode.creates_run() {
            return Err(OrchestrationError::Validation(format!(
                "mode '{}' does not dispatch agents",
                input.mode
            )));
        }

        if self.deals.get_deal(&input.deal_id).await?.is_none() {
            return Err(OrchestrationError::not_found("Deal", &input.deal_id));
        }

        let (agents, assessment) = match input.mode {
            AnalysisMode::Full => (self.registry.names(), None),
            _ => {
                let summary = self.targeted_summary(&input).await?;
                let assessment =
                    ImpactAnalyzer::new(&self.registry, &self.policy).assess(&summary.report());
                if assessment.is_empty() {
                    return Err(OrchestrationError::Precondition(format!(
                        "session {} does not impact any agent; request a delta report instead",
                        summary.session_id
                    )));
                }
                (assessment.agents.clone(), Some(assessment))
            }
        };

        let analysis = self
            .runs
            .create_run(&input.deal_id, agents, input.mode, input.session_id.clone())
            .await?;

        let job = AnalysisJob {
            deal_id: input.deal_id.clone(),
            analysis_id: analysis.id(),
            agents: analysis.agents().to_vec(),
            session_id: input.session_id.clone(),
        };

        let sent = match job.to_event() {
            Ok(event) => self.transport.send(event).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            error!(
                analysis_id = %analysis.id(),
                deal_id = %input.deal_id,
                error = %e,
                "Failed to dispatch analysis job"
            );
            if let Err(mark_err) = self
                .runs
                .mark_failed(analysis.id(), &format!("Dispatch failed: {}", e))
                .await
            {
                // Left active; the run timeout releases the deal.
                error!(
                    analysis_id = %analysis.id(),
                    error = %mark_err,
                    "Failed to mark undispatched run as failed"
                );
            }
            self.events.log(RunEvent::new(
                "dispatch_failed",
                serde_json::json!({
                    "analysis_id": analysis.id(),
                    "deal_id": input.deal_id,
                    "error": e.to_string(),
                }),
            ));
            self.alerts.notify(
                Alert::new(AlertSeverity::Critical, "Analysis dispatch failed", e.to_string())
                    .for_run(&input.deal_id, analysis.id()),
            );
            return Err(e.into());
        }

        info!(
            analysis_id = %analysis.id(),
            deal_id = %input.deal_id,
            mode = %input.mode,
            agents = job.agents.len(),
            "Analysis job dispatched"
        );
        self.events.log(RunEvent::new(
            "job_dispatched",
            serde_json::json!({
                "analysis_id": analysis.id(),
                "deal_id": input.deal_id,
                "agents": job.agents,
            }),
        ));

        Ok(DispatchOutput {
            analysis_id: analysis.id(),
            agents: job.agents,
            assessment,
        })
    }

    async fn targeted_summary(
        &self,
        input: &DispatchInput,
    ) -> Result<SessionSummary, OrchestrationError> {
        let summary = match &input.session_id {
            Some(session_id) => self.sessions.get_summary(session_id).await?,
            None => self.sessions.latest_summary_for_deal(&input.deal_id).await?,
        };

        match summary {
            Some(summary) if summary.deal_id == input.deal_id => Ok(summary),
            Some(summary) => Err(OrchestrationError::not_found("Session", &summary.session_id)),
            None => Err(OrchestrationError::Precondition(
                "no session summary available yet; post-call processing has not finished"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, RecordingTransport};
    use crate::use_cases::analysis_runs::tests::run_service;
    use diligence_domain::{AnalysisStatus, Contradiction, Finding, PostCallReport};
    use std::collections::BTreeMap;

    fn use_case(fixture: &Fixture) -> (DispatchAnalysisUseCase, Arc<AnalysisRunService>) {
        let runs = Arc::new(run_service(fixture));
        let use_case = DispatchAnalysisUseCase::new(
            Arc::new(AgentRegistry::builtin()),
            Arc::new(ImpactPolicy::default()),
            fixture.store.clone(),
            fixture.store.clone(),
            runs.clone(),
            fixture.transport.clone(),
            fixture.events.clone(),
            fixture.alerts.clone(),
        );
        (use_case, runs)
    }

    fn financial_report() -> PostCallReport {
        PostCallReport {
            new_information: vec![Finding::tagged("Burn doubled", ["financial"])],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_dispatch_runs_whole_catalog() {
        let fixture = Fixture::new();
        let (use_case, runs) = use_case(&fixture);

        let output = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap();
        assert_eq!(output.agents.len(), 18);

        let sent = fixture.transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let job = AnalysisJob::from_event(&sent[0]).unwrap();
        assert_eq!(job.analysis_id, output.analysis_id);
        assert_eq!(job.agents.len(), 18);

        let analysis = runs.get(output.analysis_id).await.unwrap();
        assert_eq!(analysis.status(), AnalysisStatus::Pending);
        assert_eq!(fixture.events.types(), vec!["run_created", "job_dispatched"]);
    }

    #[tokio::test]
    async fn test_targeted_dispatch_uses_impacted_agents() {
        let fixture = Fixture::new();
        fixture.add_session("s1", 5, &financial_report());
        let (use_case, _) = use_case(&fixture);

        let output = use_case
            .execute(
                DispatchInput::new(fixture.deal_id(), AnalysisMode::Targeted)
                    .with_session(SessionId::new("s1")),
            )
            .await
            .unwrap();
        assert_eq!(
            output.agents,
            vec![
                AgentName::new("financial-auditor"),
                AgentName::new("unit-economics"),
                AgentName::new("cap-table-auditor"),
                AgentName::new("scenario-modeler"),
            ]
        );
        assert!(output.assessment.is_some());
    }

    #[tokio::test]
    async fn test_targeted_without_summary_is_precondition() {
        let fixture = Fixture::new();
        let (use_case, _) = use_case(&fixture);

        let err = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Targeted))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Precondition(_)));
        assert_eq!(fixture.store.analysis_count(), 0);
        assert_eq!(fixture.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_targeted_with_no_material_change_creates_nothing() {
        let fixture = Fixture::new();
        fixture.add_session(
            "s1",
            5,
            &PostCallReport {
                confidence_delta: BTreeMap::from([("financial".to_string(), 0.05)]),
                ..Default::default()
            },
        );
        let (use_case, _) = use_case(&fixture);

        let err = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Targeted))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 412);
        assert_eq!(fixture.store.analysis_count(), 0);
    }

    #[tokio::test]
    async fn test_contradiction_fallback_selects_tier_one() {
        let fixture = Fixture::new();
        fixture.add_session(
            "s1",
            5,
            &PostCallReport {
                contradictions: vec![Contradiction::new("Numbers do not add up")],
                ..Default::default()
            },
        );
        let (use_case, _) = use_case(&fixture);

        let output = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Targeted))
            .await
            .unwrap();
        assert_eq!(output.agents.len(), 13);
        assert!(output.assessment.unwrap().fallback_applied);
    }

    #[tokio::test]
    async fn test_unknown_deal_is_not_found() {
        let fixture = Fixture::new();
        let (use_case, _) = use_case(&fixture);
        let err = use_case
            .execute(DispatchInput::new(DealId::new("ghost"), AnalysisMode::Full))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delta_mode_is_rejected() {
        let fixture = Fixture::new();
        let (use_case, _) = use_case(&fixture);
        let err = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Delta))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_session_of_another_deal_is_not_found() {
        let fixture = Fixture::new();
        fixture.store.add_summary(SessionSummary::from_report(
            SessionId::new("other"),
            DealId::new("deal-2"),
            crate::test_support::t0(),
            &financial_report(),
        ));
        let (use_case, _) = use_case(&fixture);

        let err = use_case
            .execute(
                DispatchInput::new(fixture.deal_id(), AnalysisMode::Targeted)
                    .with_session(SessionId::new("other")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_second_dispatch_conflicts() {
        let fixture = Fixture::new();
        let (use_case, _) = use_case(&fixture);
        use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap();

        let err = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(fixture.transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_admits_exactly_one() {
        let fixture = Fixture::new();
        let (use_case, _) = use_case(&fixture);
        let use_case = Arc::new(use_case);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let use_case = Arc::clone(&use_case);
            let deal_id = fixture.deal_id();
            handles.push(tokio::spawn(async move {
                use_case
                    .execute(DispatchInput::new(deal_id, AnalysisMode::Full))
                    .await
            }));
        }

        let mut accepted = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(OrchestrationError::Conflict { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(fixture.store.analysis_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_fails_the_run() {
        let fixture = Fixture::with_transport(RecordingTransport::failing());
        let (use_case, runs) = use_case(&fixture);

        let err = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);

        let analysis = runs.latest_for_deal(&fixture.deal_id()).await.unwrap().unwrap();
        assert_eq!(analysis.status(), AnalysisStatus::Failed);
        assert_eq!(fixture.alerts.titles(), vec!["Analysis dispatch failed"]);

        // The deal is free for another attempt
        assert!(!analysis.is_active());
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_when_run_cannot_be_failed() {
        let fixture = Fixture::with_transport(RecordingTransport::failing());
        fixture.store.fail_mark_failed();
        let (use_case, _) = use_case(&fixture);

        let err = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Transport(_)));
        assert_eq!(err.status_code(), 503);
        assert_eq!(fixture.alerts.titles(), vec!["Analysis dispatch failed"]);
        assert!(fixture.events.types().contains(&"dispatch_failed"));
    }

    #[tokio::test]
    async fn test_stale_running_run_does_not_block_dispatch() {
        let fixture = Fixture::new();
        let (use_case, runs) = use_case(&fixture);
        let first = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap();
        runs.mark_running(first.analysis_id).await.unwrap();
        fixture.clock.advance(chrono::Duration::minutes(45));

        let second = use_case
            .execute(DispatchInput::new(fixture.deal_id(), AnalysisMode::Full))
            .await
            .unwrap();
        assert_ne!(second.analysis_id, first.analysis_id);
        assert_eq!(fixture.transport.sent_count(), 2);
        assert_eq!(
            runs.get(first.analysis_id).await.unwrap().status(),
            AnalysisStatus::Failed
        );
    }
}
