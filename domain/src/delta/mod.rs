//! Delta report domain: compare a call session against what was already known.

pub mod report;
