//! In-memory port doubles shared by the use case tests.

use crate::ports::analysis_store::{AnalysisStore, CompletionRecord, ExpiryCheck, StoreError};
use crate::ports::clock::ManualClock;
use crate::ports::cost_ledger::CostLedger;
use crate::ports::job_transport::{JobEvent, JobTransport, TransportError};
use crate::ports::notifier::{Alert, AlertNotifier};
use crate::ports::records::{DealRepository, SessionSummaryRepository};
use crate::ports::run_event_logger::{RunEvent, RunEventLogger};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use diligence_domain::{
    AgentResult, Analysis, AnalysisId, CostEvent, Deal, DealId, PostCallReport, SessionId,
    SessionSummary, UserId,
};
use std::sync::{Arc, Mutex};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

// ==================== Store ====================

#[derive(Default)]
pub struct MemoryStore {
    analyses: Mutex<Vec<Analysis>>,
    deals: Mutex<Vec<Deal>>,
    summaries: Mutex<Vec<SessionSummary>>,
    fail_mark_failed: Mutex<bool>,
}

impl MemoryStore {
    pub fn add_deal(&self, deal: Deal) {
        self.deals.lock().unwrap().push(deal);
    }

    pub fn add_summary(&self, summary: SessionSummary) {
        self.summaries.lock().unwrap().push(summary);
    }

    pub fn analysis_count(&self) -> usize {
        self.analyses.lock().unwrap().len()
    }

    /// Make every later `mark_failed` call return a backend error.
    pub fn fail_mark_failed(&self) {
        *self.fail_mark_failed.lock().unwrap() = true;
    }

    fn update<T>(
        &self,
        id: AnalysisId,
        f: impl FnOnce(&mut Analysis) -> Result<T, StoreError>,
    ) -> Result<(T, Analysis), StoreError> {
        let mut analyses = self.analyses.lock().unwrap();
        let analysis = analyses
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(StoreError::AnalysisNotFound(id))?;
        let value = f(analysis)?;
        Ok((value, analysis.clone()))
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn insert_if_no_active(&self, analysis: Analysis) -> Result<(), StoreError> {
        let mut analyses = self.analyses.lock().unwrap();
        if let Some(active) = analyses
            .iter()
            .find(|a| a.deal_id() == analysis.deal_id() && a.is_active())
        {
            return Err(StoreError::ActiveRunExists {
                deal_id: active.deal_id().clone(),
                analysis_id: active.id(),
            });
        }
        analyses.push(analysis);
        Ok(())
    }

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<Analysis>, StoreError> {
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id() == id)
            .cloned())
    }

    async fn latest_analysis_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<Analysis>, StoreError> {
        Ok(self
            .analyses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|a| a.deal_id() == deal_id)
            .cloned())
    }

    async fn record_completion(
        &self,
        id: AnalysisId,
        result: AgentResult,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord, StoreError> {
        let (outcome, analysis) =
            self.update(id, |a| a.apply_completion(result, now).map_err(StoreError::from))?;
        Ok(CompletionRecord { outcome, analysis })
    }

    async fn mark_running(&self, id: AnalysisId, now: DateTime<Utc>) -> Result<Analysis, StoreError> {
        Ok(self.update(id, |a| Ok(a.mark_running(now)))?.1)
    }

    async fn mark_failed(
        &self,
        id: AnalysisId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Analysis, StoreError> {
        if *self.fail_mark_failed.lock().unwrap() {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        Ok(self.update(id, |a| Ok(a.mark_failed(reason, now)))?.1)
    }

    async fn expire_if_stale(
        &self,
        id: AnalysisId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<ExpiryCheck, StoreError> {
        let (expired, analysis) = self.update(id, |a| Ok(a.expire_if_stale(now, timeout)))?;
        Ok(ExpiryCheck { expired, analysis })
    }
}

#[async_trait]
impl DealRepository for MemoryStore {
    async fn get_deal(&self, id: &DealId) -> Result<Option<Deal>, StoreError> {
        Ok(self.deals.lock().unwrap().iter().find(|d| &d.id == id).cloned())
    }
}

#[async_trait]
impl SessionSummaryRepository for MemoryStore {
    async fn get_summary(&self, session_id: &SessionId) -> Result<Option<SessionSummary>, StoreError> {
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.session_id == session_id)
            .cloned())
    }

    async fn latest_summary_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<SessionSummary>, StoreError> {
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.deal_id == deal_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn summary_before(
        &self,
        session: &SessionSummary,
    ) -> Result<Option<SessionSummary>, StoreError> {
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.deal_id == session.deal_id && s.created_at < session.created_at)
            .max_by_key(|s| s.created_at)
            .cloned())
    }
}

// ==================== Ledger ====================

#[derive(Default)]
pub struct MemoryLedger {
    events: Mutex<Vec<CostEvent>>,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<CostEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl CostLedger for MemoryLedger {
    async fn append(&self, event: CostEvent) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn events_for_deal(&self, deal_id: &DealId) -> Result<Vec<CostEvent>, StoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.deal_id == deal_id)
            .cloned()
            .collect())
    }

    async fn events_for_user_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<CostEvent>, StoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.user_id == user_id && e.recorded_at >= since)
            .cloned()
            .collect())
    }
}

// ==================== Transport / notifications ====================

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<JobEvent>>,
    fail: Mutex<bool>,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Mutex::new(true),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl JobTransport for RecordingTransport {
    async fn send(&self, event: JobEvent) -> Result<(), TransportError> {
        if *self.fail.lock().unwrap() {
            return Err(TransportError::Rejected("queue unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlerts {
    pub alerts: Mutex<Vec<Alert>>,
}

impl RecordingAlerts {
    pub fn titles(&self) -> Vec<String> {
        self.alerts.lock().unwrap().iter().map(|a| a.title.clone()).collect()
    }
}

impl AlertNotifier for RecordingAlerts {
    fn notify(&self, alert: Alert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    pub events: Mutex<Vec<&'static str>>,
}

impl RecordingEvents {
    pub fn types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

impl RunEventLogger for RecordingEvents {
    fn log(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event.event_type);
    }
}

// ==================== Fixture ====================

/// One deal (`deal-1`, owned by `owner-1`) and a set of recording doubles.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<MemoryLedger>,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<RecordingTransport>,
    pub alerts: Arc<RecordingAlerts>,
    pub events: Arc<RecordingEvents>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_transport(RecordingTransport::default())
    }

    pub fn with_transport(transport: RecordingTransport) -> Self {
        let store = Arc::new(MemoryStore::default());
        store.add_deal(
            Deal::new(DealId::new("deal-1"), "Acme", UserId::new("owner-1"), t0())
                .with_baseline("financial", 0.6),
        );
        Self {
            store,
            ledger: Arc::new(MemoryLedger::default()),
            clock: Arc::new(ManualClock::new(t0())),
            transport: Arc::new(transport),
            alerts: Arc::new(RecordingAlerts::default()),
            events: Arc::new(RecordingEvents::default()),
        }
    }

    pub fn deal_id(&self) -> DealId {
        DealId::new("deal-1")
    }

    /// Store a summary for `deal-1`, `minutes` after t0.
    pub fn add_session(&self, session: &str, minutes: i64, report: &PostCallReport) {
        self.store.add_summary(SessionSummary::from_report(
            SessionId::new(session),
            self.deal_id(),
            t0() + Duration::minutes(minutes),
            report,
        ));
    }
}
