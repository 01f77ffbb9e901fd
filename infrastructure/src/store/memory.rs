//! In-process store for analyses, deals and session summaries.
//!
//! Every operation takes a single write lock for its whole read-modify-write,
//! which gives the same guarantees a database row lock or unique constraint
//! would: one active run per deal, and no lost completion updates. The
//! guarantees are per process; a multi-instance deployment needs a shared
//! store implementing the same port.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diligence_application::ports::analysis_store::{
    AnalysisStore, CompletionRecord, ExpiryCheck, StoreError,
};
use diligence_application::ports::records::{DealRepository, SessionSummaryRepository};
use diligence_domain::{
    AgentResult, Analysis, AnalysisId, Deal, DealId, SessionId, SessionSummary,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

#[derive(Default)]
struct State {
    analyses: HashMap<AnalysisId, Analysis>,
    /// Run ids per deal, in creation order.
    runs_by_deal: HashMap<DealId, Vec<AnalysisId>>,
    /// The PENDING/RUNNING run of each deal.
    active_by_deal: HashMap<DealId, AnalysisId>,
    deals: HashMap<DealId, Deal>,
    summaries: HashMap<SessionId, SessionSummary>,
}

impl State {
    /// Apply `f` to one run and keep the active index in sync.
    fn update<T>(
        &mut self,
        id: AnalysisId,
        f: impl FnOnce(&mut Analysis) -> Result<T, StoreError>,
    ) -> Result<(T, Analysis), StoreError> {
        let analysis = self
            .analyses
            .get_mut(&id)
            .ok_or(StoreError::AnalysisNotFound(id))?;
        let value = f(analysis)?;
        let snapshot = analysis.clone();

        if snapshot.status().is_terminal()
            && self.active_by_deal.get(snapshot.deal_id()) == Some(&id)
        {
            self.active_by_deal.remove(snapshot.deal_id());
            trace!(analysis_id = %id, deal_id = %snapshot.deal_id(), "Released active run slot");
        }

        Ok((value, snapshot))
    }
}

/// Thread-safe in-memory store
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    // ==================== Seeding ====================

    pub fn insert_deal(&self, deal: Deal) -> Result<(), StoreError> {
        self.write()?.deals.insert(deal.id.clone(), deal);
        Ok(())
    }

    pub fn insert_summary(&self, summary: SessionSummary) -> Result<(), StoreError> {
        self.write()?
            .summaries
            .insert(summary.session_id.clone(), summary);
        Ok(())
    }

    pub fn deals(&self) -> Result<Vec<Deal>, StoreError> {
        let mut deals: Vec<Deal> = self.read()?.deals.values().cloned().collect();
        deals.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(deals)
    }

    pub fn analysis_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.analyses.len())
    }
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn insert_if_no_active(&self, analysis: Analysis) -> Result<(), StoreError> {
        let mut state = self.write()?;

        if let Some(active_id) = state.active_by_deal.get(analysis.deal_id()) {
            return Err(StoreError::ActiveRunExists {
                deal_id: analysis.deal_id().clone(),
                analysis_id: *active_id,
            });
        }

        let id = analysis.id();
        let deal_id = analysis.deal_id().clone();
        if analysis.is_active() {
            state.active_by_deal.insert(deal_id.clone(), id);
        }
        state.runs_by_deal.entry(deal_id).or_default().push(id);
        state.analyses.insert(id, analysis);
        Ok(())
    }

    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<Analysis>, StoreError> {
        Ok(self.read()?.analyses.get(&id).cloned())
    }

    async fn latest_analysis_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<Analysis>, StoreError> {
        let state = self.read()?;
        Ok(state
            .runs_by_deal
            .get(deal_id)
            .and_then(|ids| ids.last())
            .and_then(|id| state.analyses.get(id))
            .cloned())
    }

    async fn record_completion(
        &self,
        id: AnalysisId,
        result: AgentResult,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord, StoreError> {
        let (outcome, analysis) = self
            .write()?
            .update(id, |a| a.apply_completion(result, now).map_err(StoreError::from))?;
        Ok(CompletionRecord { outcome, analysis })
    }

    async fn mark_running(&self, id: AnalysisId, now: DateTime<Utc>) -> Result<Analysis, StoreError> {
        Ok(self.write()?.update(id, |a| Ok(a.mark_running(now)))?.1)
    }

    async fn mark_failed(
        &self,
        id: AnalysisId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Analysis, StoreError> {
        Ok(self.write()?.update(id, |a| Ok(a.mark_failed(reason, now)))?.1)
    }

    async fn expire_if_stale(
        &self,
        id: AnalysisId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<ExpiryCheck, StoreError> {
        let (expired, analysis) = self
            .write()?
            .update(id, |a| Ok(a.expire_if_stale(now, timeout)))?;
        Ok(ExpiryCheck { expired, analysis })
    }
}

#[async_trait]
impl DealRepository for InMemoryStore {
    async fn get_deal(&self, id: &DealId) -> Result<Option<Deal>, StoreError> {
        Ok(self.read()?.deals.get(id).cloned())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryStore {
    async fn get_summary(&self, session_id: &SessionId) -> Result<Option<SessionSummary>, StoreError> {
        Ok(self.read()?.summaries.get(session_id).cloned())
    }

    async fn latest_summary_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<SessionSummary>, StoreError> {
        Ok(self
            .read()?
            .summaries
            .values()
            .filter(|s| &s.deal_id == deal_id)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.session_id.cmp(&b.session_id))
            })
            .cloned())
    }

    async fn summary_before(
        &self,
        session: &SessionSummary,
    ) -> Result<Option<SessionSummary>, StoreError> {
        Ok(self
            .read()?
            .summaries
            .values()
            .filter(|s| s.deal_id == session.deal_id && s.created_at < session.created_at)
            .max_by_key(|s| s.created_at)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use diligence_domain::{AgentName, AnalysisMode, AnalysisStatus, CompletionOutcome, UserId};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn run(deal: &str, agents: usize) -> Analysis {
        Analysis::pending(
            DealId::new(deal),
            AnalysisMode::Full,
            None,
            (0..agents).map(|i| AgentName::new(format!("agent-{i}"))).collect(),
            t0(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_admit_one_run_per_deal() {
        let store = Arc::new(InMemoryStore::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_if_no_active(run("deal-1", 3)).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(StoreError::ActiveRunExists { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.analysis_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_other_deals_are_independent() {
        let store = InMemoryStore::new();
        store.insert_if_no_active(run("deal-1", 1)).await.unwrap();
        store.insert_if_no_active(run("deal-2", 1)).await.unwrap();
        assert!(store.insert_if_no_active(run("deal-1", 1)).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completions_with_redeliveries() {
        let store = Arc::new(InMemoryStore::new());
        let analysis = run("deal-1", 18);
        let id = analysis.id();
        store.insert_if_no_active(analysis).await.unwrap();

        // Every agent delivered three times from different tasks
        let mut handles = Vec::new();
        for copy in 0..3 {
            for i in 0..18 {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    let result = if i % 6 == 0 {
                        AgentResult::failure(format!("agent-{i}"), 10, "boom")
                    } else {
                        AgentResult::success(format!("agent-{i}"), 10 + copy, 0.5)
                    };
                    store.record_completion(id, result, t0()).await
                }));
            }
        }

        let mut completed_events = 0;
        for handle in handles {
            let record = handle.await.unwrap().unwrap();
            if matches!(record.outcome, CompletionOutcome::Completed { .. }) {
                completed_events += 1;
            }
        }

        let analysis = store.get_analysis(id).await.unwrap().unwrap();
        assert_eq!(completed_events, 1);
        assert_eq!(analysis.status(), AnalysisStatus::Completed);
        assert_eq!(analysis.completed_agents(), 18);
        assert_eq!(analysis.failed_agents().len(), 3);
        assert!((analysis.total_cost() - 15.0 * 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_terminal_run_releases_the_deal() {
        let store = InMemoryStore::new();
        let analysis = run("deal-1", 1);
        let id = analysis.id();
        store.insert_if_no_active(analysis).await.unwrap();

        let check = store
            .expire_if_stale(id, t0() + Duration::minutes(31), Duration::minutes(30))
            .await
            .unwrap();
        assert!(check.expired);
        assert_eq!(check.analysis.status(), AnalysisStatus::Failed);

        let next = run("deal-1", 1);
        let next_id = next.id();
        store.insert_if_no_active(next).await.unwrap();
        let latest = store
            .latest_analysis_for_deal(&DealId::new("deal-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id(), next_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_expiry_reports_once() {
        let store = Arc::new(InMemoryStore::new());
        let analysis = run("deal-1", 2);
        let id = analysis.id();
        store.insert_if_no_active(analysis).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .expire_if_stale(id, t0() + Duration::hours(1), Duration::minutes(30))
                    .await
                    .unwrap()
                    .expired
            }));
        }
        let mut expired = 0;
        for handle in handles {
            if handle.await.unwrap() {
                expired += 1;
            }
        }
        assert_eq!(expired, 1);
    }

    #[tokio::test]
    async fn test_unknown_run_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .record_completion(AnalysisId::generate(), AgentResult::success("a", 1, 0.1), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AnalysisNotFound(_)));
    }

    #[tokio::test]
    async fn test_summaries_are_ordered_per_deal() {
        let store = InMemoryStore::new();
        store
            .insert_deal(Deal::new(DealId::new("deal-1"), "Acme", UserId::new("u1"), t0()))
            .unwrap();
        for (session, minutes, deal) in [("s1", 0, "deal-1"), ("s2", 60, "deal-1"), ("s3", 120, "deal-2")] {
            store
                .insert_summary(SessionSummary::new(
                    SessionId::new(session),
                    DealId::new(deal),
                    t0() + Duration::minutes(minutes),
                    serde_json::Value::Null,
                ))
                .unwrap();
        }

        let latest = store
            .latest_summary_for_deal(&DealId::new("deal-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.session_id, SessionId::new("s2"));

        let before = store.summary_before(&latest).await.unwrap().unwrap();
        assert_eq!(before.session_id, SessionId::new("s1"));
        assert!(store.summary_before(&before).await.unwrap().is_none());
        assert!(store.get_deal(&DealId::new("deal-1")).await.unwrap().is_some());
    }
}
