use crate::{
    assets::{media::ms_to_sample_frames, store::PreparedAudio},
    audio::output::AudioOutput,
    foundation::error::{StoryError, StoryResult},
    sequencer::machine::LineToken,
};

/// Output channel count of the graph (stereo).
pub const GRAPH_CHANNELS: u16 = 2;

struct ActiveSource {
    clip: PreparedAudio,
    token: LineToken,
    /// Fractional read position in source sample frames.
    pos: f64,
}

/// The single audio pipeline shared by playback and recording.
///
/// Exactly one source may be connected at a time. Each pump renders the source (or silence)
/// into the speaker output and, while a capture tap is attached, into the capture buffer.
pub struct AudioGraph {
    sample_rate: u32,
    output: Box<dyn AudioOutput>,
    source: Option<ActiveSource>,
    capture: Option<Vec<f32>>,
    clock: Option<(u64, u64)>,
    scratch: Vec<f32>,
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("sample_rate", &self.sample_rate)
            .field("source", &self.source.as_ref().map(|s| s.token))
            .field("capturing", &self.capture.is_some())
            .finish_non_exhaustive()
    }
}

impl AudioGraph {
    /// Graph rendering stereo at `sample_rate` into `output`.
    pub fn new(sample_rate: u32, output: Box<dyn AudioOutput>) -> Self {
        Self {
            sample_rate,
            output,
            source: None,
            capture: None,
            clock: None,
            scratch: Vec::new(),
        }
    }

    /// Graph sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Connect `clip` as the playing source for the line identified by `token`.
    ///
    /// Fails when a source is already connected or the output rejects playback.
    pub fn connect(&mut self, clip: &PreparedAudio, token: LineToken) -> StoryResult<()> {
        if let Some(active) = &self.source {
            return Err(StoryError::playback(format!(
                "audio source slot is busy (line {:?} still connected)",
                active.token
            )));
        }
        if clip.channels == 0 || clip.sample_rate == 0 {
            return Err(StoryError::playback("audio clip has no channels or no rate"));
        }
        self.output.start(self.sample_rate, GRAPH_CHANNELS)?;
        self.source = Some(ActiveSource {
            clip: clip.clone(),
            token,
            pos: 0.0,
        });
        Ok(())
    }

    /// Disconnect the current source, if any.
    pub fn disconnect(&mut self) {
        if self.source.take().is_some() {
            self.output.stop();
        }
    }

    /// Token of the connected source.
    pub fn source_token(&self) -> Option<LineToken> {
        self.source.as_ref().map(|s| s.token)
    }

    /// Attach the capture tap; samples rendered from now on are retained.
    pub fn attach_capture(&mut self) {
        self.capture = Some(Vec::new());
    }

    /// Detach the capture tap, returning what it still held.
    pub fn detach_capture(&mut self) -> Vec<f32> {
        self.capture.take().unwrap_or_default()
    }

    /// Take the samples captured since the last drain.
    pub fn drain_capture(&mut self) -> Vec<f32> {
        match self.capture.as_mut() {
            Some(buf) => std::mem::take(buf),
            None => Vec::new(),
        }
    }

    /// Whether a capture tap is attached.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Render the audio that became due by `now_ms` on the graph clock.
    ///
    /// The clock starts at the first call. While nothing is connected and no capture tap is
    /// attached the clock moves without rendering, so an idle gap never turns into a burst of
    /// silence. Returns the token of a source that reached its end.
    pub fn advance_to(&mut self, now_ms: u64) -> Option<LineToken> {
        let (origin, emitted) = *self.clock.get_or_insert((now_ms, 0));
        let due = ms_to_sample_frames(now_ms.saturating_sub(origin), self.sample_rate);
        let frames = due.saturating_sub(emitted);
        self.clock = Some((origin, emitted + frames));
        if self.is_idle() {
            return None;
        }
        self.pump(frames as usize)
    }

    /// No source connected and no capture tap attached.
    pub fn is_idle(&self) -> bool {
        self.source.is_none() && self.capture.is_none()
    }

    /// Render exactly `frames` sample frames.
    pub fn pump(&mut self, frames: usize) -> Option<LineToken> {
        if frames == 0 {
            return None;
        }
        let ch = usize::from(GRAPH_CHANNELS);
        self.scratch.clear();
        self.scratch.resize(frames * ch, 0.0);

        let mut ended = None;
        if let Some(src) = self.source.as_mut() {
            if render_source(&mut self.scratch, src, self.sample_rate) {
                ended = Some(src.token);
            }
        }
        if ended.is_some() {
            self.source = None;
            self.output.stop();
        }

        for s in &mut self.scratch {
            *s = s.clamp(-1.0, 1.0);
        }
        if let Err(e) = self.output.write(&self.scratch) {
            tracing::warn!(error = %e, "audio output write failed");
        }
        if let Some(buf) = self.capture.as_mut() {
            buf.extend_from_slice(&self.scratch);
        }
        ended
    }
}

/// Linear-resampled copy of the source into `out`; returns `true` once the source is exhausted.
fn render_source(out: &mut [f32], src: &mut ActiveSource, dst_rate: u32) -> bool {
    let ch = usize::from(GRAPH_CHANNELS);
    let samples = src.clip.interleaved_f32.as_ref();
    let src_ch = usize::from(src.clip.channels);
    let src_frames = samples.len() / src_ch;
    let step = f64::from(src.clip.sample_rate) / f64::from(dst_rate);

    for frame in out.chunks_exact_mut(ch) {
        let f0 = src.pos.floor() as usize;
        if f0 >= src_frames {
            break;
        }
        let f1 = (f0 + 1).min(src_frames - 1);
        let frac = (src.pos - f0 as f64) as f32;

        let (l, r) = if src_ch == 1 {
            let v = samples[f0] + (samples[f1] - samples[f0]) * frac;
            (v, v)
        } else {
            let (i0, i1) = (f0 * src_ch, f1 * src_ch);
            (
                samples[i0] + (samples[i1] - samples[i0]) * frac,
                samples[i0 + 1] + (samples[i1 + 1] - samples[i0 + 1]) * frac,
            )
        };
        frame[0] = l;
        frame[1] = r;
        src.pos += step;
    }
    src.pos >= src_frames as f64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
