//! Cost and credit accounting.
//!
//! - [`entities::CostEvent`]: one immutable, appended cost record per agent execution
//! - [`entities::DealCostSummary`] / [`entities::UserCostStats`]: aggregate views

pub mod entities;
