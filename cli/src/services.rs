//! Dependency wiring for one CLI invocation

use anyhow::{Context, Result};
use diligence_application::{
    AlertNotifier, AnalysisRunService, Clock, CostLedgerService, DispatchAnalysisUseCase,
    ExecuteAgentBatchUseCase, GenerateDeltaReportUseCase, NoProgress, NoRunEventLogger,
    PollAnalysisUseCase, RequestReanalysisUseCase, RunEventLogger, RunProgressNotifier,
    SlidingWindowLimiter, SystemClock,
};
use diligence_infrastructure::{
    ChannelJobTransport, DEFAULT_QUEUE_CAPACITY, FileConfig, FixtureFile, InMemoryCostLedger,
    InMemoryStore, JobWorker, JsonlRunEventLogger, ResolvedConfig, ScriptedAgentExecutor,
    TracingAlertNotifier, WorkerStats,
};
use diligence_presentation::{Cli, OutputFormat, ProgressReporter, RunArgs};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Services {
    pub store: Arc<InMemoryStore>,
    pub ledger: Arc<CostLedgerService>,
    pub dispatch: Arc<DispatchAnalysisUseCase>,
    pub delta: Arc<GenerateDeltaReportUseCase>,
    pub reanalysis: RequestReanalysisUseCase,
    pub poll: PollAnalysisUseCase,
    worker: Option<(CancellationToken, JoinHandle<WorkerStats>)>,
}

impl Services {
    /// Wire every use case over the in-memory adapters. With `run` set, a
    /// job worker backed by the scripted executor is started as well.
    pub fn build(
        cli: &Cli,
        file_config: &FileConfig,
        config: ResolvedConfig,
        run: Option<&RunArgs>,
    ) -> Result<Self> {
        let registry = Arc::new(config.registry);
        let policy = Arc::new(config.policy);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // === Records ===
        let store = Arc::new(InMemoryStore::new());
        if let Some(path) = &cli.fixture {
            FixtureFile::load(path)?.seed(&store)?;
        }

        // === Run event log ===
        let events: Arc<dyn RunEventLogger> = match file_config
            .logging
            .run_event_log
            .then(|| file_config.logging.log_dir())
            .flatten()
            .and_then(JsonlRunEventLogger::in_dir)
        {
            Some(logger) => {
                info!(path = %logger.path().display(), "Writing run events");
                Arc::new(logger)
            }
            None => Arc::new(NoRunEventLogger),
        };
        let alerts: Arc<dyn AlertNotifier> = Arc::new(TracingAlertNotifier::new());

        // === Ledger and runs ===
        let ledger = Arc::new(CostLedgerService::new(
            Arc::new(InMemoryCostLedger::new()),
            store.clone(),
            clock.clone(),
            config.ledger,
        ));
        let runs = Arc::new(AnalysisRunService::new(
            store.clone(),
            ledger.clone(),
            clock.clone(),
            config.orchestrator.clone(),
            events.clone(),
            alerts.clone(),
        ));

        // === Transport ===
        let (transport, receiver) = ChannelJobTransport::new(DEFAULT_QUEUE_CAPACITY);
        let dispatch = Arc::new(DispatchAnalysisUseCase::new(
            registry.clone(),
            policy.clone(),
            store.clone(),
            store.clone(),
            runs.clone(),
            Arc::new(transport),
            events,
            alerts,
        ));
        let delta = Arc::new(GenerateDeltaReportUseCase::new(
            registry.clone(),
            policy,
            store.clone(),
            store.clone(),
            clock.clone(),
        ));
        let reanalysis = RequestReanalysisUseCase::new(
            Arc::new(SlidingWindowLimiter::new(config.admission)),
            dispatch.clone(),
            delta.clone(),
            clock,
        );
        let poll = PollAnalysisUseCase::new(store.clone(), runs.clone());

        // === Worker ===
        let worker = match run {
            Some(run) => {
                let executor = ScriptedAgentExecutor::new(registry)
                    .with_latency(Duration::from_millis(run.latency_ms))
                    .with_failing(run.fail_agent.iter().map(String::as_str));
                let batch = Arc::new(ExecuteAgentBatchUseCase::new(
                    Arc::new(executor),
                    runs,
                    config.orchestrator,
                ));
                let progress: Arc<dyn RunProgressNotifier> =
                    if cli.quiet || cli.output == OutputFormat::Json {
                        Arc::new(NoProgress)
                    } else {
                        Arc::new(ProgressReporter::new())
                    };
                let worker = JobWorker::new(receiver, batch).with_progress(progress);
                let token = worker.cancellation_token();
                debug!("Spawning job worker");
                Some((token, tokio::spawn(worker.run())))
            }
            None => None,
        };

        Ok(Self {
            store,
            ledger,
            dispatch,
            delta,
            reanalysis,
            poll,
            worker,
        })
    }

    /// Stop taking jobs and wait for in-flight batches.
    pub async fn shutdown(&mut self) -> Result<Option<WorkerStats>> {
        match self.worker.take() {
            Some((token, handle)) => {
                token.cancel();
                let stats = handle.await.context("job worker panicked")?;
                Ok(Some(stats))
            }
            None => Ok(None),
        }
    }
}
