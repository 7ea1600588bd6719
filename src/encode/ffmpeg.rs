use std::{
    fs::File,
    io::{BufWriter, Read, Write as _},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    assets::media::samples_to_f32le_bytes,
    encode::sink::{MediaSink, SinkConfig},
    foundation::{
        core::{Fps, FrameIndex},
        error::{StoryError, StoryResult},
        math::flatten_premul_over_bg,
    },
    render::frame::FrameRGBA,
};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Background colour used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Video is encoded while recording. Audio is spooled to a raw `f32le` file next to the output,
/// padded with silence to the video length on `end`, and muxed in a second `ffmpeg` pass.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    audio_spool: Option<BufWriter<File>>,
    audio_samples: u64,
    frames: u64,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("opts", &self.opts)
            .field("running", &self.child.is_some())
            .field("frames", &self.frames)
            .field("audio_samples", &self.audio_samples)
            .finish_non_exhaustive()
    }
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            audio_spool: None,
            audio_samples: 0,
            frames: 0,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn wait_video(&mut self) -> StoryResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().map_err(|e| {
            StoryError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StoryError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| StoryError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StoryError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn finish_audio(&mut self, cfg: &SinkConfig) -> StoryResult<()> {
        let Some(audio) = cfg.audio else {
            return Ok(());
        };
        let Some(mut spool) = self.audio_spool.take() else {
            return Ok(());
        };

        let ch = u64::from(audio.channels);
        let target_frames = video_len_in_sample_frames(self.frames, cfg.fps, audio.sample_rate);
        let have_frames = self.audio_samples / ch.max(1);
        if have_frames < target_frames {
            let pad = vec![0.0f32; ((target_frames - have_frames) * ch) as usize];
            spool
                .write_all(&samples_to_f32le_bytes(&pad))
                .map_err(|e| StoryError::encode(format!("failed to pad audio spool: {e}")))?;
        }
        spool
            .flush()
            .map_err(|e| StoryError::encode(format!("failed to flush audio spool: {e}")))?;
        drop(spool);

        let video_tmp = video_tmp_path(&cfg.out_path);
        let audio_tmp = audio_tmp_path(&cfg.out_path);
        let out = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&video_tmp)
            .args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio_tmp)
            .args([
                "-c:v",
                "copy",
                "-c:a",
                "aac",
                "-shortest",
                "-movflags",
                "+faststart",
            ])
            .arg(&cfg.out_path)
            .output()
            .map_err(|e| StoryError::encode(format!("failed to spawn ffmpeg mux pass: {e}")))?;

        remove_quietly(&video_tmp);
        remove_quietly(&audio_tmp);

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(StoryError::encode(format!(
                "ffmpeg mux exited with status {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Close and delete the audio spool of a recording that never started.
    fn discard_audio_spool(&mut self, out_path: &Path) {
        if self.audio_spool.take().is_some() {
            remove_quietly(&audio_tmp_path(out_path));
        }
    }
}

impl MediaSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> StoryResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(StoryError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StoryError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(StoryError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if let Some(audio) = cfg.audio
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(StoryError::validation(
                "audio sample_rate and channels must be non-zero when audio is enabled",
            ));
        }

        ensure_parent_dir(&cfg.out_path)?;
        if !self.opts.overwrite && cfg.out_path.exists() {
            return Err(StoryError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(StoryError::capture(
                "ffmpeg is required for MP4 recording, but was not found on PATH",
            ));
        }

        let video_out = if cfg.audio.is_some() {
            let spool = File::create(audio_tmp_path(&cfg.out_path)).map_err(|e| {
                StoryError::capture(format!("failed to create audio spool file: {e}"))
            })?;
            self.audio_spool = Some(BufWriter::new(spool));
            video_tmp_path(&cfg.out_path)
        } else {
            cfg.out_path.clone()
        };

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg("-y");

        // Input: raw RGBA8 frames, flattened to opaque in push_frame.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&video_out);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.discard_audio_spool(&cfg.out_path);
                return Err(StoryError::capture(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                )));
            }
        };

        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            self.discard_audio_spool(&cfg.out_path);
            return Err(StoryError::capture(
                "failed to open ffmpeg stdin/stderr (unexpected)",
            ));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; (cfg.width * cfg.height * 4) as usize];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames = 0;
        self.audio_samples = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StoryResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StoryError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StoryError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(StoryError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(StoryError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StoryError::encode("ffmpeg sink is already finalized"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            StoryError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn push_audio(&mut self, interleaved: &[f32]) -> StoryResult<()> {
        let Some(spool) = self.audio_spool.as_mut() else {
            return Ok(());
        };
        spool
            .write_all(&samples_to_f32le_bytes(interleaved))
            .map_err(|e| StoryError::encode(format!("failed to spool audio: {e}")))?;
        self.audio_samples += interleaved.len() as u64;
        Ok(())
    }

    fn end(&mut self) -> StoryResult<()> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| StoryError::encode("ffmpeg sink not started"))?;
        let video = self.wait_video();
        if video.is_err() {
            self.audio_spool = None;
            remove_quietly(&audio_tmp_path(&cfg.out_path));
            return video;
        }
        self.finish_audio(&cfg)
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn video_len_in_sample_frames(frames: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frames) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

fn video_tmp_path(out: &Path) -> PathBuf {
    sibling_with_suffix(out, ".video.mp4")
}

fn audio_tmp_path(out: &Path) -> PathBuf {
    sibling_with_suffix(out, ".audio.f32le")
}

fn sibling_with_suffix(out: &Path, suffix: &str) -> PathBuf {
    let mut name = out
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    out.with_file_name(name)
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> StoryResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
