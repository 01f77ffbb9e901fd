//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod analysis_runs;
pub mod cost_ledger;
pub mod dispatch_analysis;
pub mod execute_agent_batch;
pub mod generate_delta_report;
pub mod poll_analysis;
pub mod request_reanalysis;
