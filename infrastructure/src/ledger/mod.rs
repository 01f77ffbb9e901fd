//! Cost ledger adapters.

mod memory;

pub use memory::InMemoryCostLedger;
