//! The controls surface: a single-owner player driven by host ticks, plus an offline export
//! driver on a virtual clock.

/// Player state, controls and tick handling.
pub mod controller;
/// Deterministic export without a display.
pub mod offline;
