//! Record storage adapters.
//!
//! [`InMemoryStore`] implements the analysis store and the read-only deal and
//! session-summary repositories behind one lock, so each port operation is
//! atomic. [`FixtureFile`] seeds it from JSON.

mod fixture;
mod memory;

pub use fixture::{FixtureError, FixtureFile};
pub use memory::InMemoryStore;
