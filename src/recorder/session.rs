use std::path::PathBuf;

use crate::{
    encode::sink::{AudioTrackConfig, MediaSink, SinkConfig},
    foundation::{
        core::{Canvas, Fps, FrameIndex},
        error::{StoryError, StoryResult},
    },
    render::frame::FrameRGBA,
};

/// Finalized output of one recording session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingArtifact {
    /// `<product>_Movie_<unix-epoch-ms>.<ext>`.
    pub file_name: String,
    /// Output directory joined with `file_name`.
    pub path: PathBuf,
    /// Video frames written.
    pub frames: u64,
    /// Interleaved audio samples written.
    pub audio_samples: u64,
    /// Video duration implied by `frames` at the session frame rate.
    pub duration_ms: u64,
}

/// Download file name for a recording finalized at `epoch_ms`.
pub fn artifact_file_name(product: &str, epoch_ms: u64, ext: &str) -> String {
    format!("{product}_Movie_{epoch_ms}.{ext}")
}

/// Recording parameters.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Video size.
    pub canvas: Canvas,
    /// Video frame rate.
    pub fps: Fps,
    /// Audio track; `None` records video only.
    pub audio: Option<AudioTrackConfig>,
    /// Product name used in the artifact name.
    pub product_name: String,
    /// Container extension.
    pub container_ext: String,
    /// Directory the artifact is written to.
    pub output_dir: PathBuf,
}

struct Session {
    sink: Box<dyn MediaSink>,
    fps: Fps,
    started_ms: u64,
    frames: u64,
    audio_samples: u64,
    last_frame: Option<FrameRGBA>,
    sink_failed: bool,
    file_name: String,
    path: PathBuf,
}

impl Session {
    fn record_failure(&mut self, what: &str, e: StoryError) {
        if !self.sink_failed {
            tracing::warn!(error = %e, "{what} failed; recording continues without it");
        }
        self.sink_failed = true;
    }

    fn fill_frames_to(&mut self, due: u64) {
        let Some(frame) = self.last_frame.as_ref() else {
            return;
        };
        while self.frames < due && !self.sink_failed {
            match self.sink.push_frame(FrameIndex(self.frames), frame) {
                Ok(()) => self.frames += 1,
                Err(e) => {
                    self.record_failure("frame capture", e);
                    return;
                }
            }
        }
    }
}

/// Captures rendered frames at a fixed rate plus the audio graph's output into a sink.
#[derive(Default)]
pub struct Recorder {
    session: Option<Session>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Recorder");
        if let Some(s) = &self.session {
            d.field("file_name", &s.file_name)
                .field("frames", &s.frames)
                .field("audio_samples", &s.audio_samples);
        }
        d.finish_non_exhaustive()
    }
}

impl Recorder {
    /// Recorder without a session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session is running.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Begin a session at `now_ms`. The artifact name is fixed here from `epoch_ms`.
    #[tracing::instrument(skip(self, sink, cfg), fields(fps = cfg.fps.as_f64()))]
    pub fn start_session(
        &mut self,
        mut sink: Box<dyn MediaSink>,
        cfg: &SessionConfig,
        now_ms: u64,
        epoch_ms: u64,
    ) -> StoryResult<()> {
        if self.session.is_some() {
            return Err(StoryError::capture("a recording session is already running"));
        }
        let file_name = artifact_file_name(&cfg.product_name, epoch_ms, &cfg.container_ext);
        let path = cfg.output_dir.join(&file_name);
        sink.begin(SinkConfig {
            width: cfg.canvas.width,
            height: cfg.canvas.height,
            fps: cfg.fps,
            audio: cfg.audio,
            out_path: path.clone(),
        })
        .map_err(|e| match e {
            StoryError::Capture(_) => e,
            other => StoryError::capture(format!("media sink failed to start: {other}")),
        })?;

        tracing::info!(file = %file_name, "recording started");
        self.session = Some(Session {
            sink,
            fps: cfg.fps,
            started_ms: now_ms,
            frames: 0,
            audio_samples: 0,
            last_frame: None,
            sink_failed: false,
            file_name,
            path,
        });
        Ok(())
    }

    /// Frames whose slot has come due by `now_ms` but have not been written yet.
    pub fn frames_due(&self, now_ms: u64) -> u64 {
        match &self.session {
            Some(s) => s
                .fps
                .frames_due(now_ms.saturating_sub(s.started_ms))
                .saturating_sub(s.frames),
            None => 0,
        }
    }

    /// Write `frame` into every slot due by `now_ms`, duplicating it when ticks are slower than
    /// the recording rate.
    pub fn capture_frame(&mut self, now_ms: u64, frame: &FrameRGBA) {
        let pending = self.frames_due(now_ms);
        let Some(s) = self.session.as_mut() else {
            return;
        };
        if pending == 0 {
            return;
        }
        s.last_frame = Some(frame.clone());
        let target = s.frames + pending;
        s.fill_frames_to(target);
    }

    /// Append captured audio.
    pub fn capture_audio(&mut self, interleaved: &[f32]) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        if interleaved.is_empty() || s.sink_failed {
            return;
        }
        match s.sink.push_audio(interleaved) {
            Ok(()) => s.audio_samples += interleaved.len() as u64,
            Err(e) => s.record_failure("audio capture", e),
        }
    }

    /// Finalize the session and clear it, even when the sink fails to finalize.
    #[tracing::instrument(skip(self))]
    pub fn stop_session(&mut self, now_ms: u64) -> StoryResult<RecordingArtifact> {
        let mut s = self
            .session
            .take()
            .ok_or_else(|| StoryError::capture("no recording session is running"))?;

        // Hold the last frame until the stop time so video covers the whole session.
        let due = s.fps.frames_due(now_ms.saturating_sub(s.started_ms));
        s.fill_frames_to(due);

        let end = s.sink.end();
        let artifact = RecordingArtifact {
            file_name: s.file_name,
            path: s.path,
            frames: s.frames,
            audio_samples: s.audio_samples,
            duration_ms: (s.fps.frame_to_ms(FrameIndex(s.frames))).round() as u64,
        };
        match end {
            Ok(()) => {
                tracing::info!(
                    file = %artifact.file_name,
                    frames = artifact.frames,
                    duration_ms = artifact.duration_ms,
                    "recording finalized"
                );
                Ok(artifact)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file = %artifact.file_name,
                    "recording finalization failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/recorder/session.rs"]
mod tests;
