//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent_executor;
pub mod analysis_store;
pub mod clock;
pub mod cost_ledger;
pub mod job_transport;
pub mod notifier;
pub mod progress;
pub mod records;
pub mod run_event_logger;
