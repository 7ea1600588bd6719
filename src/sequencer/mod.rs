//! Single-owner playback state machine over scenes and dialogue lines.

/// Cursor and dwell policy.
pub mod cursor;
/// States, events and directives.
pub mod machine;
