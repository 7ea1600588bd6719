use crate::foundation::error::StoryResult;

/// Speaker-side sink of the audio graph.
///
/// `start` is called every time a clip is connected and may reject playback (for example when
/// the host's device is unavailable); the graph then reports the clip as not playable.
pub trait AudioOutput: Send {
    /// Prepare the device for interleaved `f32` samples at the given format.
    fn start(&mut self, sample_rate: u32, channels: u16) -> StoryResult<()>;
    /// Deliver rendered interleaved samples.
    fn write(&mut self, interleaved: &[f32]) -> StoryResult<()>;
    /// Source disconnected; the device may go idle.
    fn stop(&mut self) {}
}

/// Output that discards samples. Used for headless export and tests.
#[derive(Debug, Default)]
pub struct NullOutput {
    frames_written: u64,
    channels: u16,
}

impl NullOutput {
    /// New discarding output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample frames delivered since construction.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl AudioOutput for NullOutput {
    fn start(&mut self, _sample_rate: u32, channels: u16) -> StoryResult<()> {
        self.channels = channels;
        Ok(())
    }

    fn write(&mut self, interleaved: &[f32]) -> StoryResult<()> {
        let ch = usize::from(self.channels.max(1));
        self.frames_written += (interleaved.len() / ch) as u64;
        Ok(())
    }
}
