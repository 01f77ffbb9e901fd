//! Cost ledger use case
//!
//! Records one cost event per agent execution and serves aggregate reads.
//! Events are attributed to the deal owner so user statistics can be
//! computed without joining deals at read time.

use crate::config::LedgerParams;
use crate::error::OrchestrationError;
use crate::ports::clock::Clock;
use crate::ports::cost_ledger::CostLedger;
use crate::ports::records::DealRepository;
use chrono::Duration;
use diligence_domain::{
    AgentName, AnalysisId, CostEvent, Deal, DealCostSummary, DealId, UserCostStats, UserId,
};
use std::sync::Arc;
use tracing::debug;

/// Longest accepted statistics window.
pub const MAX_WINDOW_DAYS: u32 = 365;

pub struct CostLedgerService {
    ledger: Arc<dyn CostLedger>,
    deals: Arc<dyn DealRepository>,
    clock: Arc<dyn Clock>,
    params: LedgerParams,
}

impl CostLedgerService {
    pub fn new(
        ledger: Arc<dyn CostLedger>,
        deals: Arc<dyn DealRepository>,
        clock: Arc<dyn Clock>,
        params: LedgerParams,
    ) -> Self {
        Self {
            ledger,
            deals,
            clock,
            params,
        }
    }

    /// Append an immutable cost event for one agent execution.
    pub async fn record_agent_cost(
        &self,
        analysis_id: AnalysisId,
        deal_id: &DealId,
        agent_name: &AgentName,
        cost: f64,
    ) -> Result<CostEvent, OrchestrationError> {
        let deal = self.deal(deal_id).await?;
        let event = CostEvent::new(
            analysis_id,
            deal.id,
            deal.owner_id,
            agent_name.clone(),
            cost,
            self.clock.now(),
        )?;
        self.ledger.append(event.clone()).await?;

        debug!(
            analysis_id = %analysis_id,
            agent = %agent_name,
            cost,
            "Recorded agent cost"
        );
        Ok(event)
    }

    /// Append a correction of `delta` to an agent's recorded cost.
    pub async fn record_cost_adjustment(
        &self,
        analysis_id: AnalysisId,
        deal_id: &DealId,
        agent_name: &AgentName,
        delta: f64,
    ) -> Result<CostEvent, OrchestrationError> {
        let deal = self.deal(deal_id).await?;
        let event = CostEvent::adjustment(
            analysis_id,
            deal.id,
            deal.owner_id,
            agent_name.clone(),
            delta,
            self.clock.now(),
        )?;
        self.ledger.append(event.clone()).await?;

        debug!(
            analysis_id = %analysis_id,
            agent = %agent_name,
            delta,
            "Recorded cost adjustment"
        );
        Ok(event)
    }

    async fn deal(&self, deal_id: &DealId) -> Result<Deal, OrchestrationError> {
        self.deals
            .get_deal(deal_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("Deal", deal_id))
    }

    pub async fn get_deal_cost_summary(
        &self,
        deal_id: &DealId,
    ) -> Result<DealCostSummary, OrchestrationError> {
        let events = self.ledger.events_for_deal(deal_id).await?;
        Ok(DealCostSummary::from_events(deal_id, &events))
    }

    pub async fn get_user_stats(
        &self,
        user_id: &UserId,
        window_days: u32,
    ) -> Result<UserCostStats, OrchestrationError> {
        if window_days == 0 || window_days > MAX_WINDOW_DAYS {
            return Err(OrchestrationError::Validation(format!(
                "window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        let since = self.clock.now() - Duration::days(i64::from(window_days));
        let events = self.ledger.events_for_user_since(user_id, since).await?;
        Ok(UserCostStats::from_events(
            user_id,
            window_days,
            since,
            self.params.credits_per_usd,
            &events,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, MemoryLedger};

    fn service(fixture: &Fixture) -> CostLedgerService {
        CostLedgerService::new(
            fixture.ledger.clone(),
            fixture.store.clone(),
            fixture.clock.clone(),
            LedgerParams::default(),
        )
    }

    #[tokio::test]
    async fn test_record_attributes_cost_to_deal_owner() {
        let fixture = Fixture::new();
        let service = service(&fixture);
        let run = AnalysisId::generate();

        let event = service
            .record_agent_cost(run, &fixture.deal_id(), &AgentName::new("team-investigator"), 0.4)
            .await
            .unwrap();
        assert_eq!(event.user_id, UserId::new("owner-1"));
        assert_eq!(fixture.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_record_unknown_deal_is_not_found() {
        let fixture = Fixture::new();
        let err = service(&fixture)
            .record_agent_cost(AnalysisId::generate(), &DealId::new("ghost"), &AgentName::new("a"), 0.1)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_record_negative_cost_is_rejected() {
        let fixture = Fixture::new();
        let err = service(&fixture)
            .record_agent_cost(AnalysisId::generate(), &fixture.deal_id(), &AgentName::new("a"), -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
        assert_eq!(fixture.ledger.len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_are_summed() {
        let fixture = Fixture::new();
        let service = Arc::new(service(&fixture));
        let run = AnalysisId::generate();

        let mut handles = Vec::new();
        for i in 0..20 {
            let service = Arc::clone(&service);
            let deal_id = fixture.deal_id();
            handles.push(tokio::spawn(async move {
                service
                    .record_agent_cost(run, &deal_id, &AgentName::new(format!("agent-{}", i % 4)), 0.5)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let summary = service.get_deal_cost_summary(&fixture.deal_id()).await.unwrap();
        assert_eq!(summary.event_count, 20);
        assert!((summary.total_cost - 10.0).abs() < 1e-9);
        assert_eq!(summary.by_agent.len(), 4);
    }

    #[tokio::test]
    async fn test_user_stats_window_validation() {
        let fixture = Fixture::new();
        let service = service(&fixture);
        assert!(service.get_user_stats(&UserId::new("owner-1"), 0).await.is_err());
        assert!(service.get_user_stats(&UserId::new("owner-1"), 400).await.is_err());

        service
            .record_agent_cost(AnalysisId::generate(), &fixture.deal_id(), &AgentName::new("a"), 0.25)
            .await
            .unwrap();
        let stats = service.get_user_stats(&UserId::new("owner-1"), 30).await.unwrap();
        assert_eq!(stats.agent_calls, 1);
        assert_eq!(stats.credits, 25);
    }

    #[test]
    fn test_memory_ledger_starts_empty() {
        assert_eq!(MemoryLedger::default().len(), 0);
    }
}
