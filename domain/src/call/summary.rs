//! Persisted session summary record

use super::report::PostCallReport;
use crate::core::ids::{DealId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One summary per call session, written by the post-call pipeline.
///
/// The payload is kept loosely typed; [`SessionSummary::report`] rebuilds the
/// [`PostCallReport`] on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub deal_id: DealId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Value,
}

impl SessionSummary {
    pub fn new(
        session_id: SessionId,
        deal_id: DealId,
        created_at: DateTime<Utc>,
        payload: Value,
    ) -> Self {
        Self {
            session_id,
            deal_id,
            created_at,
            payload,
        }
    }

    /// Convenience constructor from an already-typed report.
    pub fn from_report(
        session_id: SessionId,
        deal_id: DealId,
        created_at: DateTime<Utc>,
        report: &PostCallReport,
    ) -> Self {
        Self::new(session_id, deal_id, created_at, report.to_payload())
    }

    pub fn report(&self) -> PostCallReport {
        PostCallReport::from_payload(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::report::Finding;

    #[test]
    fn test_report_rebuilds_from_payload() {
        let report = PostCallReport {
            new_information: vec![Finding::tagged("Hired a CFO", ["team"])],
            ..Default::default()
        };
        let summary = SessionSummary::from_report(
            SessionId::new("s1"),
            DealId::new("d1"),
            Utc::now(),
            &report,
        );
        assert_eq!(summary.report(), report);
    }

    #[test]
    fn test_null_payload_yields_empty_report() {
        let summary = SessionSummary::new(SessionId::new("s1"), DealId::new("d1"), Utc::now(), Value::Null);
        assert!(summary.report().is_empty());
    }
}
