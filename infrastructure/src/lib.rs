//! Infrastructure layer for diligence
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the in-process store and ledger, the channel
//! job transport and its worker, the scripted agent executor, alerting,
//! run event logging, and configuration file loading.

pub mod agents;
pub mod config;
pub mod ledger;
pub mod logging;
pub mod notification;
pub mod store;
pub mod transport;
pub mod worker;

// Re-export commonly used types
pub use agents::{ScriptedAgentExecutor, TierCosts};
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, ResolvedConfig};
pub use ledger::InMemoryCostLedger;
pub use logging::JsonlRunEventLogger;
pub use notification::TracingAlertNotifier;
pub use store::{FixtureError, FixtureFile, InMemoryStore};
pub use transport::{ChannelJobTransport, DEFAULT_QUEUE_CAPACITY, JobReceiver};
pub use worker::{JobWorker, WorkerStats};
