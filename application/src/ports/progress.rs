//! Progress notification port
//!
//! Defines the interface for reporting progress while an agent batch runs.

use diligence_domain::{AgentName, Analysis, AnalysisId};

/// Callback for progress updates during batch execution
///
/// Implementations live in the presentation layer (progress bars, web
/// sockets, ...).
pub trait RunProgressNotifier: Send + Sync {
    /// Called when the job runtime picks up a batch
    fn on_batch_start(&self, analysis_id: AnalysisId, total_agents: usize);

    /// Called after each agent result has been recorded
    fn on_agent_complete(&self, agent: &AgentName, success: bool, completed: usize, total: usize);

    /// Called once the batch has no agent left to run
    fn on_batch_complete(&self, analysis: &Analysis);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl RunProgressNotifier for NoProgress {
    fn on_batch_start(&self, _analysis_id: AnalysisId, _total_agents: usize) {}
    fn on_agent_complete(&self, _agent: &AgentName, _success: bool, _completed: usize, _total: usize) {}
    fn on_batch_complete(&self, _analysis: &Analysis) {}
}
