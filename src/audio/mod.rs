//! The shared audio graph: one source slot, one speaker output and an optional capture tap.

/// Source slot, resampling and capture tap.
pub mod graph;
/// Speaker output capability.
pub mod output;
