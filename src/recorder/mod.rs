//! Recording sessions: frame and audio capture into a [`crate::MediaSink`].

/// Session lifecycle and artifact naming.
pub mod session;
