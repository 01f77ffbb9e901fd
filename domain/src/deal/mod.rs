//! Deal records owned by the external store.

pub mod entities;
