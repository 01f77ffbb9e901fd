//! Background job worker
//!
//! Consumes [`JobEvent`]s from the channel transport and runs each agent
//! batch through [`ExecuteAgentBatchUseCase`]. Batches for different runs
//! execute concurrently; a batch never blocks the receive loop.
//!
//! Cancelling the worker's token stops it from taking new jobs. Batches that
//! already started are allowed to finish, so their agent results are still
//! recorded.

use crate::transport::JobReceiver;
use diligence_application::ports::job_transport::{AnalysisJob, JobEvent};
use diligence_application::ports::progress::{NoProgress, RunProgressNotifier};
use diligence_application::use_cases::execute_agent_batch::{BatchReport, ExecuteAgentBatchUseCase};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Totals over the worker's lifetime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerStats {
    pub jobs_received: usize,
    pub batches_completed: usize,
    pub batches_skipped: usize,
    pub batches_failed: usize,
    pub malformed_events: usize,
}

pub struct JobWorker {
    receiver: JobReceiver,
    batch: Arc<ExecuteAgentBatchUseCase>,
    progress: Arc<dyn RunProgressNotifier>,
    cancellation: CancellationToken,
}

impl JobWorker {
    pub fn new(receiver: JobReceiver, batch: Arc<ExecuteAgentBatchUseCase>) -> Self {
        Self {
            receiver,
            batch,
            progress: Arc::new(NoProgress),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn RunProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that stops this worker when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run until the token is cancelled or every transport handle is dropped,
    /// then wait for in-flight batches.
    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let mut in_flight: JoinSet<Option<BatchReport>> = JoinSet::new();

        info!("Job worker started");
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    debug!("Job worker cancelled");
                    break;
                }
                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    Self::tally(&mut stats, finished);
                    continue;
                }
                event = self.receiver.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!("Job transport closed");
                        break;
                    }
                },
            };

            stats.jobs_received += 1;
            let Some(job) = Self::decode(&event) else {
                stats.malformed_events += 1;
                continue;
            };

            let batch = Arc::clone(&self.batch);
            let progress = Arc::clone(&self.progress);
            in_flight.spawn(async move {
                let analysis_id = job.analysis_id;
                match batch.execute_with_progress(job, progress.as_ref()).await {
                    Ok(report) => Some(report),
                    Err(e) => {
                        error!(analysis_id = %analysis_id, error = %e, "Agent batch failed");
                        None
                    }
                }
            });
        }

        while let Some(finished) = in_flight.join_next().await {
            Self::tally(&mut stats, finished);
        }

        info!(
            jobs = stats.jobs_received,
            completed = stats.batches_completed,
            skipped = stats.batches_skipped,
            failed = stats.batches_failed,
            "Job worker stopped"
        );
        stats
    }

    fn decode(event: &JobEvent) -> Option<AnalysisJob> {
        match AnalysisJob::from_event(event) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(event = %event.name, error = %e, "Dropping malformed job event");
                None
            }
        }
    }

    fn tally(stats: &mut WorkerStats, finished: Result<Option<BatchReport>, tokio::task::JoinError>) {
        match finished {
            Ok(Some(report)) if report.skipped => stats.batches_skipped += 1,
            Ok(Some(_)) => stats.batches_completed += 1,
            Ok(None) => stats.batches_failed += 1,
            Err(e) => {
                error!(error = %e, "Agent batch task panicked");
                stats.batches_failed += 1;
            }
        }
    }
}
