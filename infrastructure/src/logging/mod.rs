//! Logging infrastructure: structured run event logging.
//!
//! Provides [`JsonlRunEventLogger`], an append-only JSONL writer that
//! implements the [`RunEventLogger`](diligence_application::RunEventLogger)
//! port.

mod jsonl_run_log;

pub use jsonl_run_log::JsonlRunEventLogger;
