//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`OrchestratorParams`]: run timeout, per-agent timeout, batch parallelism
//! - [`AdmissionParams`]: per-caller re-analysis rate limit
//! - [`LedgerParams`]: cost to credit conversion

pub mod admission_params;
pub mod orchestrator_params;

pub use admission_params::{AdmissionParams, LedgerParams};
pub use orchestrator_params::OrchestratorParams;
