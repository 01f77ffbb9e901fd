//! Request Re-analysis use case
//!
//! Caller-facing entry point after a call: validates the raw request, applies
//! per-caller admission control to run-creating modes, then either answers
//! synchronously with a delta report or accepts a background run.

use crate::admission::SlidingWindowLimiter;
use crate::error::OrchestrationError;
use crate::ports::clock::Clock;
use crate::use_cases::dispatch_analysis::{DispatchAnalysisUseCase, DispatchInput};
use crate::use_cases::generate_delta_report::GenerateDeltaReportUseCase;
use diligence_domain::{AgentName, AnalysisId, AnalysisMode, DealId, DeltaReport, SessionId, UserId};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Unvalidated request as received from a caller
#[derive(Debug, Clone)]
pub struct ReanalysisRequest {
    pub deal_id: String,
    pub session_id: String,
    pub mode: String,
    pub caller: UserId,
    pub is_admin: bool,
}

impl ReanalysisRequest {
    pub fn new(
        deal_id: impl Into<String>,
        session_id: impl Into<String>,
        mode: impl Into<String>,
        caller: UserId,
    ) -> Self {
        Self {
            deal_id: deal_id.into(),
            session_id: session_id.into(),
            mode: mode.into(),
            caller,
            is_admin: false,
        }
    }

    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// Successful response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReanalysisResponse {
    /// `delta`: the comparison itself (200).
    Delta(DeltaReport),
    /// `targeted` / `full`: a run was started (202).
    Accepted {
        analysis_id: AnalysisId,
        agents: Vec<AgentName>,
    },
}

impl ReanalysisResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            ReanalysisResponse::Delta(_) => 200,
            ReanalysisResponse::Accepted { .. } => 202,
        }
    }
}

pub struct RequestReanalysisUseCase {
    limiter: Arc<SlidingWindowLimiter>,
    dispatch: Arc<DispatchAnalysisUseCase>,
    delta: Arc<GenerateDeltaReportUseCase>,
    clock: Arc<dyn Clock>,
}

impl RequestReanalysisUseCase {
    pub fn new(
        limiter: Arc<SlidingWindowLimiter>,
        dispatch: Arc<DispatchAnalysisUseCase>,
        delta: Arc<GenerateDeltaReportUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limiter,
            dispatch,
            delta,
            clock,
        }
    }

    pub async fn execute(
        &self,
        request: ReanalysisRequest,
    ) -> Result<ReanalysisResponse, OrchestrationError> {
        let deal_id = DealId::parse(&request.deal_id)?;
        let session_id = SessionId::parse(&request.session_id)?;
        let mode: AnalysisMode = request.mode.parse()?;

        info!(
            deal_id = %deal_id,
            session_id = %session_id,
            mode = %mode,
            caller = %request.caller,
            "Re-analysis requested"
        );

        if !mode.creates_run() {
            let report = self.delta.execute(&session_id, &deal_id).await?;
            return Ok(ReanalysisResponse::Delta(report));
        }

        self.limiter
            .admit(&request.caller, request.is_admin, self.clock.now())?;

        let output = self
            .dispatch
            .execute(DispatchInput::new(deal_id, mode).with_session(session_id))
            .await?;

        Ok(ReanalysisResponse::Accepted {
            analysis_id: output.analysis_id,
            agents: output.agents,
        })
    }
}
