//! Application layer for diligence
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod admission;
pub mod config;
pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use admission::SlidingWindowLimiter;
pub use config::{AdmissionParams, LedgerParams, OrchestratorParams};
pub use error::OrchestrationError;
pub use ports::{
    agent_executor::{AgentExecutor, AgentInvocation, AgentOutput, ExecutorError},
    analysis_store::{AnalysisStore, CompletionRecord, ExpiryCheck, StoreError},
    clock::{Clock, ManualClock, SystemClock},
    cost_ledger::CostLedger,
    job_transport::{AGENTS_REQUESTED_EVENT, AnalysisJob, JobEvent, JobTransport, TransportError},
    notifier::{Alert, AlertNotifier, AlertSeverity, NoAlerts},
    progress::{NoProgress, RunProgressNotifier},
    records::{DealRepository, SessionSummaryRepository},
    run_event_logger::{NoRunEventLogger, RunEvent, RunEventLogger},
};
pub use use_cases::analysis_runs::AnalysisRunService;
pub use use_cases::cost_ledger::CostLedgerService;
pub use use_cases::dispatch_analysis::{DispatchAnalysisUseCase, DispatchInput, DispatchOutput};
pub use use_cases::execute_agent_batch::{BatchReport, ExecuteAgentBatchUseCase};
pub use use_cases::generate_delta_report::GenerateDeltaReportUseCase;
pub use use_cases::poll_analysis::{AnalysisStatusView, PollAnalysisUseCase, RunTimings};
pub use use_cases::request_reanalysis::{
    ReanalysisRequest, ReanalysisResponse, RequestReanalysisUseCase,
};
