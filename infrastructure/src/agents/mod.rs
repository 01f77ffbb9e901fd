//! Agent executor adapters.
//!
//! Model-backed agents live in the job runtime of a real deployment. The
//! [`ScriptedAgentExecutor`] runs locally with deterministic output so the
//! orchestration can be exercised end to end.

mod scripted;

pub use scripted::{ScriptedAgentExecutor, TierCosts};
