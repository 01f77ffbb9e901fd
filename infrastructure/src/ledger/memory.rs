//! Append-only in-memory cost ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diligence_application::ports::analysis_store::StoreError;
use diligence_application::ports::cost_ledger::CostLedger;
use diligence_domain::{CostEvent, DealId, UserId};
use std::sync::RwLock;
use tracing::trace;

/// Events are only ever pushed; reads filter and clone.
#[derive(Default)]
pub struct InMemoryCostLedger {
    events: RwLock<Vec<CostEvent>>,
}

impl InMemoryCostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, keep: impl Fn(&CostEvent) -> bool) -> Result<Vec<CostEvent>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))?;
        Ok(events.iter().filter(|e| keep(e)).cloned().collect())
    }
}

#[async_trait]
impl CostLedger for InMemoryCostLedger {
    async fn append(&self, event: CostEvent) -> Result<(), StoreError> {
        trace!(
            analysis_id = %event.analysis_id,
            agent = %event.agent_name,
            cost = event.cost,
            "Appending cost event"
        );
        self.events
            .write()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }

    async fn events_for_deal(&self, deal_id: &DealId) -> Result<Vec<CostEvent>, StoreError> {
        self.filtered(|e| &e.deal_id == deal_id)
    }

    async fn events_for_user_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<CostEvent>, StoreError> {
        self.filtered(|e| &e.user_id == user_id && e.recorded_at >= since)
    }
}
