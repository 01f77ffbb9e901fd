//! Analysis run lifecycle
//!
//! Thin orchestration over the [`AnalysisStore`]'s atomic operations. Every
//! transition goes through the store so that several process instances can
//! share the same runs; this service adds logging, cost recording and
//! alerts around them.

use crate::config::OrchestratorParams;
use crate::error::OrchestrationError;
use crate::ports::analysis_store::{AnalysisStore, CompletionRecord, StoreError};
use crate::ports::clock::Clock;
use crate::ports::notifier::{Alert, AlertNotifier, AlertSeverity};
use crate::ports::run_event_logger::{RunEvent, RunEventLogger};
use crate::use_cases::cost_ledger::CostLedgerService;
use diligence_domain::{
    AgentName, AgentResult, Analysis, AnalysisId, AnalysisMode, CompletionOutcome, DealId,
    SessionId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COST_EPSILON: f64 = 1e-12;

pub struct AnalysisRunService {
    store: Arc<dyn AnalysisStore>,
    ledger: Arc<CostLedgerService>,
    clock: Arc<dyn Clock>,
    params: OrchestratorParams,
    events: Arc<dyn RunEventLogger>,
    alerts: Arc<dyn AlertNotifier>,
}

impl AnalysisRunService {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        ledger: Arc<CostLedgerService>,
        clock: Arc<dyn Clock>,
        params: OrchestratorParams,
        events: Arc<dyn RunEventLogger>,
        alerts: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            params,
            events,
            alerts,
        }
    }

    pub fn params(&self) -> &OrchestratorParams {
        &self.params
    }

    /// Create a PENDING run, failing with `Conflict` if the deal already has
    /// an active one. An active run past its timeout is expired first.
    pub async fn create_run(
        &self,
        deal_id: &DealId,
        agents: Vec<AgentName>,
        mode: AnalysisMode,
        session_id: Option<SessionId>,
    ) -> Result<Analysis, OrchestrationError> {
        if agents.is_empty() {
            return Err(OrchestrationError::Validation(
                "an analysis needs at least one agent".to_string(),
            ));
        }

        let analysis = Analysis::pending(deal_id.clone(), mode, session_id, agents, self.clock.now());
        match self.store.insert_if_no_active(analysis.clone()).await {
            Ok(()) => {}
            Err(StoreError::ActiveRunExists { analysis_id, .. }) => {
                // The blocking run may be past its timeout without anyone
                // having read it yet; expire it and retry once.
                let blocking = self.get(analysis_id).await?;
                if blocking.is_active() {
                    return Err(OrchestrationError::Conflict {
                        deal_id: deal_id.clone(),
                        analysis_id,
                    });
                }
                debug!(
                    analysis_id = %analysis_id,
                    deal_id = %deal_id,
                    "Stale run released the deal"
                );
                self.store.insert_if_no_active(analysis.clone()).await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            analysis_id = %analysis.id(),
            deal_id = %deal_id,
            mode = %mode,
            total_agents = analysis.total_agents(),
            "Analysis run created"
        );
        self.events.log(RunEvent::new(
            "run_created",
            serde_json::json!({
                "analysis_id": analysis.id(),
                "deal_id": deal_id,
                "mode": mode,
                "type": analysis.analysis_type(),
                "session_id": analysis.session_id(),
                "agents": analysis.agents(),
            }),
        ));

        Ok(analysis)
    }

    /// Merge one agent result into its run.
    ///
    /// Redeliveries replace the stored result without counting again. The
    /// first delivery writes its cost to the ledger; a redelivery writes
    /// only the change in cost, if any.
    pub async fn record_agent_completion(
        &self,
        analysis_id: AnalysisId,
        result: AgentResult,
    ) -> Result<CompletionRecord, OrchestrationError> {
        let agent = result.agent_name.clone();
        let success = result.success;
        let cost = result.cost;
        let error = result.error.clone();

        let record = self
            .store
            .record_completion(analysis_id, result, self.clock.now())
            .await?;
        let analysis = &record.analysis;

        match &record.outcome {
            CompletionOutcome::Ignored { status } => {
                debug!(
                    analysis_id = %analysis_id,
                    agent = %agent,
                    status = %status,
                    "Dropped completion for terminal run"
                );
                return Ok(record);
            }
            CompletionOutcome::Duplicate { .. } => {
                debug!(analysis_id = %analysis_id, agent = %agent, "Duplicate completion");
            }
            CompletionOutcome::Progressed {
                completed_agents,
                total_agents,
            } => {
                debug!(
                    analysis_id = %analysis_id,
                    agent = %agent,
                    success,
                    completed_agents,
                    total_agents,
                    "Agent completed"
                );
            }
            CompletionOutcome::Completed { .. } => {}
        }

        if !success {
            warn!(
                analysis_id = %analysis_id,
                agent = %agent,
                error = error.as_deref().unwrap_or("unknown"),
                "Agent failed"
            );
        }

        self.events.log(RunEvent::new(
            "agent_completed",
            serde_json::json!({
                "analysis_id": analysis_id,
                "agent": agent,
                "success": success,
                "cost": cost,
                "duplicate": !record.outcome.is_first_delivery(),
                "completed_agents": analysis.completed_agents(),
                "total_agents": analysis.total_agents(),
            }),
        ));

        let recorded = match record.outcome {
            CompletionOutcome::Duplicate { previous_cost, .. } => {
                // Redelivery with a different cost: append the difference so
                // the ledger keeps summing to the run's total.
                let delta = cost - previous_cost;
                if delta.abs() > COST_EPSILON {
                    self.ledger
                        .record_cost_adjustment(analysis_id, analysis.deal_id(), &agent, delta)
                        .await
                        .map(|_| ())
                } else {
                    Ok(())
                }
            }
            _ => self
                .ledger
                .record_agent_cost(analysis_id, analysis.deal_id(), &agent, cost)
                .await
                .map(|_| ()),
        };
        if let Err(e) = recorded {
            // The completion is already persisted; a ledger outage only
            // loses the cost event.
            warn!(analysis_id = %analysis_id, agent = %agent, error = %e, "Failed to record agent cost");
        }

        if let CompletionOutcome::Completed {
            total_agents,
            failed_agents,
            total_cost,
            total_time_ms,
        } = record.outcome
        {
            info!(
                analysis_id = %analysis_id,
                deal_id = %analysis.deal_id(),
                total_agents,
                failed_agents,
                total_cost,
                total_time_ms,
                "Analysis run completed"
            );
            self.events.log(RunEvent::new(
                "run_completed",
                serde_json::json!({
                    "analysis_id": analysis_id,
                    "deal_id": analysis.deal_id(),
                    "total_agents": total_agents,
                    "failed_agents": failed_agents,
                    "total_cost": total_cost,
                    "total_time_ms": total_time_ms,
                }),
            ));
            if failed_agents > 0 {
                let failed: Vec<String> = analysis
                    .failed_agents()
                    .iter()
                    .map(|a| a.to_string())
                    .collect();
                self.alerts.notify(
                    Alert::new(
                        AlertSeverity::Warning,
                        "Agents failed during analysis",
                        format!(
                            "{} of {} agents failed: {}",
                            failed_agents,
                            total_agents,
                            failed.join(", ")
                        ),
                    )
                    .for_run(analysis.deal_id(), analysis_id),
                );
            }
        }

        Ok(record)
    }

    /// PENDING → RUNNING once the job runtime picks the batch up.
    pub async fn mark_running(&self, analysis_id: AnalysisId) -> Result<Analysis, OrchestrationError> {
        Ok(self.store.mark_running(analysis_id, self.clock.now()).await?)
    }

    pub async fn mark_failed(
        &self,
        analysis_id: AnalysisId,
        reason: &str,
    ) -> Result<Analysis, OrchestrationError> {
        let analysis = self
            .store
            .mark_failed(analysis_id, reason, self.clock.now())
            .await?;
        warn!(analysis_id = %analysis_id, reason, "Analysis run failed");
        Ok(analysis)
    }

    /// Lazy timeout check: fail `analysis` if it is active and older than
    /// the configured run timeout. Terminal runs are returned unchanged.
    pub async fn check_and_expire(&self, analysis: Analysis) -> Result<Analysis, OrchestrationError> {
        if !analysis.is_active() {
            return Ok(analysis);
        }

        let check = self
            .store
            .expire_if_stale(analysis.id(), self.clock.now(), self.params.run_timeout_delta())
            .await?;

        if check.expired {
            let analysis = &check.analysis;
            warn!(
                analysis_id = %analysis.id(),
                deal_id = %analysis.deal_id(),
                completed_agents = analysis.completed_agents(),
                total_agents = analysis.total_agents(),
                "Analysis run timed out"
            );
            self.events.log(RunEvent::new(
                "run_expired",
                serde_json::json!({
                    "analysis_id": analysis.id(),
                    "deal_id": analysis.deal_id(),
                    "completed_agents": analysis.completed_agents(),
                    "total_agents": analysis.total_agents(),
                }),
            ));
            self.alerts.notify(
                Alert::new(
                    AlertSeverity::Warning,
                    "Analysis timed out",
                    format!(
                        "{} of {} agents reported before the {} minute timeout",
                        analysis.completed_agents(),
                        analysis.total_agents(),
                        self.params.run_timeout.as_secs() / 60
                    ),
                )
                .for_run(analysis.deal_id(), analysis.id()),
            );
        }

        Ok(check.analysis)
    }

    /// Fetch a run by id, applying the timeout check.
    pub async fn get(&self, analysis_id: AnalysisId) -> Result<Analysis, OrchestrationError> {
        let analysis = self
            .store
            .get_analysis(analysis_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("Analysis", analysis_id))?;
        self.check_and_expire(analysis).await
    }

    /// The deal's most recent run, applying the timeout check.
    pub async fn latest_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<Analysis>, OrchestrationError> {
        match self.store.latest_analysis_for_deal(deal_id).await? {
            Some(analysis) => Ok(Some(self.check_and_expire(analysis).await?)),
            None => Ok(None),
        }
    }
}
