//! Alerts delivered through `tracing`
//!
//! Maps alert severity to a log level under the `diligence::alert` target,
//! so an operator can route alerts separately with an `EnvFilter` directive
//! or a dedicated subscriber layer.

use diligence_application::ports::notifier::{Alert, AlertNotifier, AlertSeverity};
use tracing::{error, info, warn};

pub const ALERT_TARGET: &str = "diligence::alert";

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertNotifier;

impl TracingAlertNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl AlertNotifier for TracingAlertNotifier {
    fn notify(&self, alert: Alert) {
        let deal_id = alert.deal_id.as_ref().map(ToString::to_string).unwrap_or_default();
        let analysis_id = alert
            .analysis_id
            .map(|id| id.to_string())
            .unwrap_or_default();

        match alert.severity {
            AlertSeverity::Critical => error!(
                target: ALERT_TARGET,
                deal_id = %deal_id,
                analysis_id = %analysis_id,
                detail = %alert.detail,
                "{}",
                alert.title
            ),
            AlertSeverity::Warning => warn!(
                target: ALERT_TARGET,
                deal_id = %deal_id,
                analysis_id = %analysis_id,
                detail = %alert.detail,
                "{}",
                alert.title
            ),
            AlertSeverity::Info => info!(
                target: ALERT_TARGET,
                deal_id = %deal_id,
                analysis_id = %analysis_id,
                detail = %alert.detail,
                "{}",
                alert.title
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diligence_domain::{AnalysisId, DealId};

    #[test]
    fn test_notify_without_subscriber_is_silent() {
        let notifier = TracingAlertNotifier::new();
        notifier.notify(Alert::new(AlertSeverity::Info, "Started", ""));
        notifier.notify(
            Alert::new(AlertSeverity::Critical, "Analysis dispatch failed", "closed")
                .for_run(&DealId::new("deal-1"), AnalysisId::generate()),
        );
    }
}
