//! Analysis store port
//!
//! The persistent store owns the two atomic operations the orchestrator
//! depends on:
//!
//! - **insert-if-no-active**: a run is only inserted when the deal has no
//!   PENDING/RUNNING run. This is the single-active-run guard; it must be
//!   enforced here (unique constraint or transaction), never by an
//!   in-process lock, because several process instances may race.
//! - **record-completion**: merge one agent result and bump the progress
//!   counter in a single row-level update, so callbacks arriving from
//!   concurrent workers cannot lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diligence_domain::{
    AgentResult, Analysis, AnalysisId, CompletionOutcome, DealId, DomainError,
};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Deal {deal_id} already has an active analysis ({analysis_id})")]
    ActiveRunExists {
        deal_id: DealId,
        analysis_id: AnalysisId,
    },

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(AnalysisId),

    #[error("Update rejected: {0}")]
    Rejected(#[from] DomainError),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Outcome of an atomic completion update, with the record as persisted.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    pub outcome: CompletionOutcome,
    pub analysis: Analysis,
}

/// Outcome of a lazy timeout check, with the record as persisted.
#[derive(Debug, Clone)]
pub struct ExpiryCheck {
    /// `true` if this check moved the run to FAILED.
    pub expired: bool,
    pub analysis: Analysis,
}

/// Persistence for analysis runs
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert `analysis` only if its deal has no active run.
    ///
    /// Fails with [`StoreError::ActiveRunExists`] otherwise; nothing is written.
    async fn insert_if_no_active(&self, analysis: Analysis) -> Result<(), StoreError>;

    /// Fetch one run by id.
    async fn get_analysis(&self, id: AnalysisId) -> Result<Option<Analysis>, StoreError>;

    /// The most recently created run for a deal, whatever its status.
    async fn latest_analysis_for_deal(
        &self,
        deal_id: &DealId,
    ) -> Result<Option<Analysis>, StoreError>;

    /// Atomically merge one agent result into a run.
    async fn record_completion(
        &self,
        id: AnalysisId,
        result: AgentResult,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord, StoreError>;

    /// PENDING → RUNNING (no-op for any other status).
    async fn mark_running(&self, id: AnalysisId, now: DateTime<Utc>)
        -> Result<Analysis, StoreError>;

    /// Fail an active run with `reason` (no-op for terminal runs).
    async fn mark_failed(
        &self,
        id: AnalysisId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Analysis, StoreError>;

    /// Compare-and-set timeout: fail the run if it is active and older than
    /// `timeout`, persisting the change before returning.
    async fn expire_if_stale(
        &self,
        id: AnalysisId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<ExpiryCheck, StoreError>;
}
