//! Generate Delta Report use case
//!
//! `delta` mode: compare a session against what was known before. Pure
//! read; no run is created and no agent executes.

use crate::error::OrchestrationError;
use crate::ports::clock::Clock;
use crate::ports::records::{DealRepository, SessionSummaryRepository};
use diligence_domain::{
    AgentRegistry, DealId, DeltaReport, ImpactAnalyzer, ImpactPolicy, SessionId,
};
use std::sync::Arc;
use tracing::info;

pub struct GenerateDeltaReportUseCase {
    registry: Arc<AgentRegistry>,
    policy: Arc<ImpactPolicy>,
    deals: Arc<dyn DealRepository>,
    sessions: Arc<dyn SessionSummaryRepository>,
    clock: Arc<dyn Clock>,
}

impl GenerateDeltaReportUseCase {
    pub fn new(
        registry: Arc<AgentRegistry>,
        policy: Arc<ImpactPolicy>,
        deals: Arc<dyn DealRepository>,
        sessions: Arc<dyn SessionSummaryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            policy,
            deals,
            sessions,
            clock,
        }
    }

    pub async fn execute(
        &self,
        session_id: &SessionId,
        deal_id: &DealId,
    ) -> Result<DeltaReport, OrchestrationError> {
        let summary = self
            .sessions
            .get_summary(session_id)
            .await?
            .filter(|s| &s.deal_id == deal_id)
            .ok_or_else(|| OrchestrationError::not_found("Session", session_id))?;

        let deal = self
            .deals
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("Deal", deal_id))?;

        let report = summary.report();
        let previous = self.sessions.summary_before(&summary).await?;
        let previous_report = previous.as_ref().map(|p| (&p.session_id, p.report()));

        let impact = ImpactAnalyzer::new(&self.registry, &self.policy).assess(&report);
        let delta = DeltaReport::compare(
            &deal,
            session_id.clone(),
            &report,
            previous_report.as_ref().map(|(id, r)| (*id, r)),
            &impact,
            &self.policy,
            self.clock.now(),
        );

        info!(
            deal_id = %deal_id,
            session_id = %session_id,
            improved = delta.improved.len(),
            worsened = delta.worsened.len(),
            newly_unresolved = delta.newly_unresolved.len(),
            "Delta report generated"
        );

        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, t0};
    use diligence_domain::{Contradiction, PostCallReport, SessionSummary};
    use std::collections::BTreeMap;

    fn use_case(fixture: &Fixture) -> GenerateDeltaReportUseCase {
        GenerateDeltaReportUseCase::new(
            Arc::new(AgentRegistry::builtin()),
            Arc::new(ImpactPolicy::default()),
            fixture.store.clone(),
            fixture.store.clone(),
            fixture.clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_delta_against_baseline_and_previous_session() {
        let fixture = Fixture::new();
        fixture.add_session(
            "s1",
            0,
            &PostCallReport {
                contradictions: vec![Contradiction::new("Churn is 8%")],
                ..Default::default()
            },
        );
        fixture.add_session(
            "s2",
            60,
            &PostCallReport {
                confidence_delta: BTreeMap::from([("financial".to_string(), -0.2)]),
                contradictions: vec![
                    Contradiction::new("Churn is 8%"),
                    Contradiction::new("Runway is 9 months, not 18"),
                ],
                ..Default::default()
            },
        );

        let delta = use_case(&fixture)
            .execute(&SessionId::new("s2"), &fixture.deal_id())
            .await
            .unwrap();
        assert_eq!(delta.worsened.len(), 1);
        assert_eq!(delta.worsened[0].baseline, Some(0.6));
        assert_eq!(delta.recurring.len(), 1);
        assert_eq!(delta.newly_unresolved.len(), 1);
        assert_eq!(delta.compared_to_session, Some(SessionId::new("s1")));
        assert!(delta.warrants_reanalysis());
        assert_eq!(fixture.store.analysis_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let fixture = Fixture::new();
        let err = use_case(&fixture)
            .execute(&SessionId::new("nope"), &fixture.deal_id())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Session not found: nope");
    }

    #[tokio::test]
    async fn test_session_of_other_deal_is_not_found() {
        let fixture = Fixture::new();
        fixture.store.add_summary(SessionSummary::from_report(
            SessionId::new("s9"),
            DealId::new("deal-2"),
            t0(),
            &PostCallReport::default(),
        ));
        let err = use_case(&fixture)
            .execute(&SessionId::new("s9"), &fixture.deal_id())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_first_session_has_no_comparison() {
        let fixture = Fixture::new();
        fixture.add_session("s1", 0, &PostCallReport::default());
        let delta = use_case(&fixture)
            .execute(&SessionId::new("s1"), &fixture.deal_id())
            .await
            .unwrap();
        assert_eq!(delta.compared_to_session, None);
        assert!(!delta.warrants_reanalysis());
    }
}
