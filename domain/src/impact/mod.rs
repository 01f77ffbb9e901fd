//! Impact analysis domain.
//!
//! Maps what a call surfaced ([`PostCallReport`](crate::call::report::PostCallReport))
//! to the minimal set of agents that must re-run.
//!
//! - [`policy::ImpactPolicy`]: materiality threshold and tag aliases (configuration)
//! - [`analyzer::ImpactAnalyzer`]: the pure impact computation

pub mod analyzer;
pub mod policy;
