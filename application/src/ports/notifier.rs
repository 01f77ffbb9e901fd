//! Operational alert port
//!
//! Delivers alerts about runs that need a human look (timeouts, dispatch
//! failures, agents failing inside a batch). Delivery is best-effort and
//! synchronous; a failing channel must not affect orchestration.

use diligence_domain::{AnalysisId, DealId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// One operational alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: String,
    pub detail: String,
    pub deal_id: Option<DealId>,
    pub analysis_id: Option<AnalysisId>,
}

impl Alert {
    pub fn new(severity: AlertSeverity, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            detail: detail.into(),
            deal_id: None,
            analysis_id: None,
        }
    }

    pub fn for_run(mut self, deal_id: &DealId, analysis_id: AnalysisId) -> Self {
        self.deal_id = Some(deal_id.clone());
        self.analysis_id = Some(analysis_id);
        self
    }
}

pub trait AlertNotifier: Send + Sync {
    fn notify(&self, alert: Alert);
}

/// Drops every alert
pub struct NoAlerts;

impl AlertNotifier for NoAlerts {
    fn notify(&self, _alert: Alert) {}
}
