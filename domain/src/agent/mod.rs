//! Agent catalog domain.
//!
//! - [`entities::AgentDefinition`]: one catalog entry (name, tier, domain tags)
//! - [`registry::AgentRegistry`]: the ordered catalog with tag resolution
//! - [`validation::ConfigIssue`]: issues found while validating configuration

pub mod entities;
pub mod registry;
pub mod validation;
