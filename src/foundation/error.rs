/// Convenience result type used across StoryReel.
pub type StoryResult<T> = Result<T, StoryError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Per-line and per-asset failures are absorbed inside the player; only session level failures
/// (a recording that cannot start, a project that does not validate) reach callers.
#[derive(thiserror::Error, Debug)]
pub enum StoryError {
    /// Invalid user-provided project or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An asset could not be resolved or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// The audio pipeline refused to start or continue playback.
    #[error("playback error: {0}")]
    Playback(String),

    /// A recording session could not be started or captured.
    #[error("capture error: {0}")]
    Capture(String),

    /// The media encoder failed while consuming or finalizing output.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoryError {
    /// Build a [`StoryError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StoryError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`StoryError::Playback`] value.
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Build a [`StoryError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`StoryError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`StoryError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
