//! Domain layer for diligence
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Agents
//!
//! A catalog of analysis agents, each covering a set of domain tags:
//!
//! - **Tier 1**: domain specialists (financial, legal, team, ...)
//! - **Tier 3**: cross-cutting synthesizers that build on Tier 1 output
//!
//! ## Analysis runs
//!
//! An [`Analysis`] is one batch execution of a resolved agent set against a
//! deal. At most one run per deal may be active (PENDING or RUNNING).
//!
//! ## Re-analysis after a call
//!
//! A [`PostCallReport`] describes what a call surfaced. The
//! [`ImpactAnalyzer`] maps it to the minimal agent set (`targeted` mode), and
//! [`DeltaReport`] compares it against the baseline without running any
//! agent (`delta` mode).

pub mod agent;
pub mod analysis;
pub mod call;
pub mod core;
pub mod cost;
pub mod deal;
pub mod delta;
pub mod impact;

// Re-export commonly used types
pub use agent::{
    entities::{AgentDefinition, AgentName, AgentTier, DomainTag},
    registry::AgentRegistry,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use analysis::{
    entities::{
        Analysis, AnalysisMode, AnalysisStatus, AnalysisType, CompletionOutcome, TIMEOUT_SUMMARY,
    },
    result::AgentResult,
};
pub use call::{
    report::{Contradiction, Finding, PostCallReport, SessionStats},
    summary::SessionSummary,
};
pub use core::{
    error::DomainError,
    ids::{AnalysisId, DealId, SessionId, UserId},
};
pub use cost::entities::{AgentCostTotals, CostEvent, DealCostSummary, UserCostStats};
pub use deal::entities::Deal;
pub use delta::report::{DeltaReport, ShiftDirection, TopicShift};
pub use impact::{
    analyzer::{ImpactAnalyzer, ImpactAssessment},
    policy::ImpactPolicy,
};
