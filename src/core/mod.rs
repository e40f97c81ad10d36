//! Selection helpers shared by the store.

/// Uniform pick and per-tier tallies.
pub mod select;
