//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: validated identifiers for deals, sessions, users and analyses
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
