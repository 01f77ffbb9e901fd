//! Analysis run domain.
//!
//! - [`entities::Analysis`]: one batch run of agents against a deal, with its state machine
//! - [`entities::AnalysisMode`]: `delta`, `targeted` or `full`
//! - [`result::AgentResult`]: per-agent execution envelope

pub mod entities;
pub mod result;
