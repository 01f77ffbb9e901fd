//! Cost ledger port
//!
//! Append-only storage of [`CostEvent`]s. Writers never update existing
//! entries, so parallel agent completions for the same run cannot overwrite
//! each other.

use super::analysis_store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diligence_domain::{CostEvent, DealId, UserId};

#[async_trait]
pub trait CostLedger: Send + Sync {
    async fn append(&self, event: CostEvent) -> Result<(), StoreError>;

    async fn events_for_deal(&self, deal_id: &DealId) -> Result<Vec<CostEvent>, StoreError>;

    async fn events_for_user_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<CostEvent>, StoreError>;
}
