use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{
    core::{Canvas, Fps},
    error::{StoryError, StoryResult},
};

/// Environment variable overriding [`PlayerConfig::font_path`].
pub const ENV_FONT: &str = "STORYREEL_FONT";
/// Environment variable overriding [`PlayerConfig::output_dir`].
pub const ENV_OUTPUT_DIR: &str = "STORYREEL_OUTPUT_DIR";

/// Sequencer timing policy, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum on-screen time of a line without audio.
    pub dwell_floor_ms: u64,
    /// Per-character dwell time of a line without audio.
    pub dwell_per_char_ms: u64,
    /// Pause between the last line of a scene and the next scene.
    pub scene_pause_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dwell_floor_ms: 2000,
            dwell_per_char_ms: 50,
            scene_pause_ms: 1000,
        }
    }
}

/// Player, renderer and recorder configuration.
///
/// Every field has a default; a JSON file only needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Logical drawing surface, independent of on-screen size.
    pub canvas: Canvas,
    /// Recording frame rate.
    pub record_fps: u32,
    /// Audio graph sample rate in Hz.
    pub sample_rate: u32,
    /// Sequencer timing policy.
    pub timing: TimingConfig,
    /// Product name used in recording file names.
    pub product_name: String,
    /// Container extension for recordings.
    pub container_ext: String,
    /// Directory recordings are written to.
    pub output_dir: PathBuf,
    /// Surface clear colour (straight RGBA8).
    pub clear_rgba: [u8; 4],
    /// Font used for subtitles. Without it captions are measured approximately and only the
    /// caption box is drawn.
    pub font_path: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::HD,
            record_fps: 30,
            sample_rate: crate::assets::media::MIX_SAMPLE_RATE,
            timing: TimingConfig::default(),
            product_name: "StoryReel".to_string(),
            container_ext: "mp4".to_string(),
            output_dir: PathBuf::from("."),
            clear_rgba: [0, 0, 0, 255],
            font_path: None,
        }
    }
}

impl PlayerConfig {
    /// Load a JSON configuration file, then apply environment overrides and validate.
    pub fn from_json_file(path: &Path) -> StoryResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: PlayerConfig = serde_json::from_slice(&bytes)
            .map_err(|e| StoryError::serde(format!("config '{}': {e}", path.display())))?;
        let cfg = cfg.with_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `STORYREEL_FONT` / `STORYREEL_OUTPUT_DIR` when set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(font) = std::env::var_os(ENV_FONT).filter(|v| !v.is_empty()) {
            self.font_path = Some(PathBuf::from(font));
        }
        if let Some(dir) = std::env::var_os(ENV_OUTPUT_DIR).filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    /// Validate sizes and rates.
    pub fn validate(&self) -> StoryResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(StoryError::validation("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            // Recordings target yuv420p output.
            return Err(StoryError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX) {
            return Err(StoryError::validation("canvas width/height must fit in u16"));
        }
        if self.record_fps == 0 {
            return Err(StoryError::validation("record_fps must be non-zero"));
        }
        if self.sample_rate == 0 {
            return Err(StoryError::validation("sample_rate must be non-zero"));
        }
        if self.product_name.trim().is_empty() {
            return Err(StoryError::validation("product_name must be non-empty"));
        }
        if self.container_ext.is_empty() || self.container_ext.contains(['.', '/', '\\']) {
            return Err(StoryError::validation(
                "container_ext must be a bare extension such as 'mp4'",
            ));
        }
        Ok(())
    }

    /// Recording frame rate as a validated [`Fps`].
    pub fn fps(&self) -> StoryResult<Fps> {
        Fps::whole(self.record_fps)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
