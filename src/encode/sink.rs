use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    foundation::{
        core::{Fps, FrameIndex},
        error::{StoryError, StoryResult},
    },
    render::frame::FrameRGBA,
};

/// Configuration provided to a [`MediaSink`] at the start of a recording session.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Audio track, if the session records one.
    pub audio: Option<AudioTrackConfig>,
    /// Where the finalized container is written.
    pub out_path: PathBuf,
}

/// Interleaved `f32` audio track format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTrackConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Sink contract for a recording session.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order; audio
/// chunks are pushed in capture order and may interleave with frames.
pub trait MediaSink: Send {
    /// Called once before anything is pushed.
    fn begin(&mut self, cfg: SinkConfig) -> StoryResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StoryResult<()>;
    /// Push interleaved audio samples.
    fn push_audio(&mut self, interleaved: &[f32]) -> StoryResult<()>;
    /// Finalize the output. Called once, also after a failed push.
    fn end(&mut self) -> StoryResult<()>;
}

/// Everything an [`InMemorySink`] received.
#[derive(Debug, Default)]
pub struct InMemoryCapture {
    /// Configuration passed to `begin`.
    pub config: Option<SinkConfig>,
    /// Frames in timeline order.
    pub frames: Vec<(FrameIndex, FrameRGBA)>,
    /// Interleaved audio samples.
    pub audio: Vec<f32>,
    /// Times `begin` was called.
    pub begins: u32,
    /// Times `end` was called.
    pub ends: u32,
}

/// In-memory sink for tests and debugging.
///
/// Clones share one capture, so a test can keep a handle while the player owns the sink.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    capture: Arc<Mutex<InMemoryCapture>>,
    fail_begin: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose `begin` always fails, for exercising start-up rollback.
    pub fn failing() -> Self {
        Self {
            fail_begin: true,
            ..Self::default()
        }
    }

    /// Lock and inspect the capture.
    pub fn capture(&self) -> MutexGuard<'_, InMemoryCapture> {
        self.capture.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MediaSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryResult<()> {
        if self.fail_begin {
            return Err(StoryError::capture("in-memory sink configured to fail"));
        }
        let mut c = self.capture();
        c.config = Some(cfg);
        c.frames.clear();
        c.audio.clear();
        c.begins += 1;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StoryResult<()> {
        let mut c = self.capture();
        if let Some((last, _)) = c.frames.last()
            && idx.0 <= last.0
        {
            return Err(StoryError::encode("out-of-order frame index"));
        }
        c.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn push_audio(&mut self, interleaved: &[f32]) -> StoryResult<()> {
        self.capture().audio.extend_from_slice(interleaved);
        Ok(())
    }

    fn end(&mut self) -> StoryResult<()> {
        self.capture().ends += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
