//! Execute Agent Batch use case
//!
//! Handler side of the job transport: runs every agent of a dispatched batch
//! in parallel and reports each result back through the run service. A
//! failing, panicking or timed-out agent becomes a failed [`AgentResult`];
//! it never aborts the batch.
//!
//! Redelivered jobs only run the agents that have not reported yet, and jobs
//! for runs that are already terminal are skipped.

use crate::config::OrchestratorParams;
use crate::error::OrchestrationError;
use crate::ports::agent_executor::{AgentExecutor, AgentInvocation, ExecutorError};
use crate::ports::job_transport::AnalysisJob;
use crate::ports::progress::{NoProgress, RunProgressNotifier};
use crate::use_cases::analysis_runs::AnalysisRunService;
use diligence_domain::{AgentName, AgentResult, AnalysisId, AnalysisStatus};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// What a batch execution did
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub analysis_id: AnalysisId,
    /// Agents executed by this delivery.
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `true` when the run was already terminal and nothing executed.
    pub skipped: bool,
    pub final_status: AnalysisStatus,
}

/// Use case for running one dispatched agent batch
pub struct ExecuteAgentBatchUseCase {
    executor: Arc<dyn AgentExecutor>,
    runs: Arc<AnalysisRunService>,
    params: OrchestratorParams,
}

impl ExecuteAgentBatchUseCase {
    pub fn new(
        executor: Arc<dyn AgentExecutor>,
        runs: Arc<AnalysisRunService>,
        params: OrchestratorParams,
    ) -> Self {
        Self {
            executor,
            runs,
            params,
        }
    }

    /// Execute the batch with default (no-op) progress
    pub async fn execute(&self, job: AnalysisJob) -> Result<BatchReport, OrchestrationError> {
        self.execute_with_progress(job, &NoProgress).await
    }

    /// Execute the batch with progress callbacks
    pub async fn execute_with_progress(
        &self,
        job: AnalysisJob,
        progress: &dyn RunProgressNotifier,
    ) -> Result<BatchReport, OrchestrationError> {
        let analysis = self.runs.get(job.analysis_id).await?;
        if analysis.status().is_terminal() {
            info!(
                analysis_id = %job.analysis_id,
                status = %analysis.status(),
                "Skipping batch for terminal run"
            );
            return Ok(BatchReport {
                analysis_id: job.analysis_id,
                executed: 0,
                succeeded: 0,
                failed: 0,
                skipped: true,
                final_status: analysis.status(),
            });
        }

        let analysis = self.runs.mark_running(job.analysis_id).await?;
        let pending: Vec<AgentName> = analysis.missing_agents().into_iter().cloned().collect();
        let total = analysis.total_agents();

        info!(
            analysis_id = %job.analysis_id,
            deal_id = %job.deal_id,
            pending = pending.len(),
            total,
            "Executing agent batch"
        );
        progress.on_batch_start(job.analysis_id, total);

        let semaphore = Arc::new(Semaphore::new(self.params.max_parallel_agents.max(1)));
        let timeout = self.params.agent_timeout;
        let mut join_set = JoinSet::new();

        for agent in pending {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let invocation = AgentInvocation {
                analysis_id: job.analysis_id,
                deal_id: job.deal_id.clone(),
                agent,
                session_id: job.session_id.clone(),
            };

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let started = Instant::now();
                let run = AssertUnwindSafe(tokio::time::timeout(
                    timeout,
                    executor.execute(&invocation),
                ))
                .catch_unwind()
                .await;
                let elapsed = started.elapsed().as_millis() as u64;

                match run {
                    Ok(Ok(Ok(output))) => {
                        let result = AgentResult::success(invocation.agent, elapsed, output.cost);
                        match output.data {
                            Some(data) => result.with_data(data),
                            None => result,
                        }
                    }
                    Ok(Ok(Err(e))) => AgentResult::failure(invocation.agent, elapsed, e.to_string()),
                    Ok(Err(_)) => AgentResult::failure(
                        invocation.agent,
                        elapsed,
                        ExecutorError::Timeout(timeout.as_secs()).to_string(),
                    ),
                    Err(_) => AgentResult::failure(invocation.agent, elapsed, "Agent panicked"),
                }
            });
        }

        let mut executed = 0;
        let mut succeeded = 0;
        let mut failed = 0;

        while let Some(joined) = join_set.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    // Tasks catch their own panics; this only happens on abort.
                    warn!(analysis_id = %job.analysis_id, error = %e, "Agent task aborted");
                    continue;
                }
            };

            executed += 1;
            if result.success {
                succeeded += 1;
            } else {
                failed += 1;
            }

            let agent = result.agent_name.clone();
            let success = result.success;
            match self.runs.record_agent_completion(job.analysis_id, result).await {
                Ok(record) => {
                    progress.on_agent_complete(
                        &agent,
                        success,
                        record.analysis.completed_agents(),
                        record.analysis.total_agents(),
                    );
                }
                Err(e) => {
                    warn!(
                        analysis_id = %job.analysis_id,
                        agent = %agent,
                        error = %e,
                        "Failed to record agent completion"
                    );
                }
            }
        }

        let analysis = self.runs.get(job.analysis_id).await?;
        debug!(
            analysis_id = %job.analysis_id,
            executed,
            succeeded,
            failed,
            status = %analysis.status(),
            "Agent batch finished"
        );
        progress.on_batch_complete(&analysis);

        Ok(BatchReport {
            analysis_id: job.analysis_id,
            executed,
            succeeded,
            failed,
            skipped: false,
            final_status: analysis.status(),
        })
    }
}
