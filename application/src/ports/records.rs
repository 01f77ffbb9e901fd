//! Read ports for records owned by the external CRUD layer.
//!
//! Deals and session summaries are created elsewhere (deal management, the
//! post-call pipeline); the orchestrator only reads them.

use super::analysis_store::StoreError;
use async_trait::async_trait;
use diligence_domain::{Deal, DealId, SessionId, SessionSummary};

/// Read access to deals
#[async_trait]
pub trait DealRepository: Send + Sync {
    async fn get_deal(&self, id: &DealId) -> Result<Option<Deal>, StoreError>;
}

/// Read access to persisted session summaries
#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    async fn get_summary(&self, session_id: &SessionId)
        -> Result<Option<SessionSummary>, StoreError>;

    /// The deal's most recent summary.
    async fn latest_summary_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<SessionSummary>, StoreError>;

    /// The deal's most recent summary created before `session`.
    async fn summary_before(
        &self,
        session: &SessionSummary,
    ) -> Result<Option<SessionSummary>, StoreError>;
}
