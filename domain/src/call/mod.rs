//! Call session domain.
//!
//! - [`report::PostCallReport`]: what a call surfaced (new facts, contradictions, confidence shifts)
//! - [`summary::SessionSummary`]: the persisted record a report is rebuilt from

pub mod report;
pub mod summary;
