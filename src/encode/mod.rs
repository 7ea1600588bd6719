//! Encoding sinks.
//!
//! Sinks consume recorded frames in timeline order plus the captured audio, and are driven by
//! the recorder.

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Media sink trait and the in-memory sink.
pub mod sink;
