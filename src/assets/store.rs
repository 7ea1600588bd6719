use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    assets::{decode as assets_decode, media},
    foundation::error::{StoryError, StoryResult},
    model::project::{AssetRef, Project},
};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Single-colour image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, premul_rgba: [u8; 4]) -> Self {
        let mut px = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            px.extend_from_slice(&premul_rgba);
        }
        Self {
            width,
            height,
            rgba8_premul: Arc::new(px),
        }
    }
}

#[derive(Clone, Debug)]
/// Prepared audio clip stored as interleaved `f32` PCM.
pub struct PreparedAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved PCM samples.
    pub interleaved_f32: Arc<Vec<f32>>,
}

impl PreparedAudio {
    /// Wrap decoded PCM.
    pub fn from_pcm(pcm: media::AudioPcm) -> Self {
        Self {
            sample_rate: pcm.sample_rate,
            channels: pcm.channels,
            interleaved_f32: Arc::new(pcm.interleaved_f32),
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Clip duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (self.frames() as f64) * 1000.0 / f64::from(self.sample_rate)
    }
}

/// Decoded assets keyed by the handles a [`Project`] references.
///
/// Assets may be inserted at any time, including after playback started; the player looks them
/// up lazily when a line or scene becomes current.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    root: Option<PathBuf>,
    images: HashMap<AssetRef, PreparedImage>,
    audio: HashMap<AssetRef, PreparedAudio>,
}

impl AssetStore {
    /// Empty store; assets are inserted by the host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every asset `project` references, resolving handles as paths relative to `root`.
    ///
    /// Assets that cannot be read or decoded are skipped with a warning; playback degrades to
    /// an empty background or a dwell-timed line for them.
    #[tracing::instrument(skip(project, root))]
    pub fn prepare(project: &Project, root: impl Into<PathBuf>, sample_rate: u32) -> Self {
        let mut out = Self {
            root: Some(root.into()),
            ..Self::default()
        };
        let (images, audio) = project.referenced_assets();
        for r in images {
            if let Err(e) = out.load_image(&r) {
                tracing::warn!(asset = %r, error = %e, "background image unavailable");
            }
        }
        for r in audio {
            if let Err(e) = out.load_audio(&r, sample_rate) {
                tracing::warn!(asset = %r, error = %e, "dialogue audio unavailable");
            }
        }
        out
    }

    /// Root directory used when resolving relative handles.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Read and decode an image handle from the root directory.
    pub fn load_image(&mut self, r: &AssetRef) -> StoryResult<()> {
        let bytes = self.read_bytes(r)?;
        let image = assets_decode::decode_image(&bytes)?;
        self.images.insert(r.clone(), image);
        Ok(())
    }

    /// Decode an audio handle from the root directory at `sample_rate`.
    pub fn load_audio(&mut self, r: &AssetRef, sample_rate: u32) -> StoryResult<()> {
        let path = self.resolve_path(r)?;
        let pcm = media::decode_audio_f32_stereo(&path, sample_rate)?;
        self.audio.insert(r.clone(), PreparedAudio::from_pcm(pcm));
        Ok(())
    }

    /// Insert (or replace) a decoded image.
    pub fn insert_image(&mut self, r: AssetRef, image: PreparedImage) {
        self.images.insert(r, image);
    }

    /// Insert (or replace) a decoded audio clip.
    pub fn insert_audio(&mut self, r: AssetRef, audio: PreparedAudio) {
        self.audio.insert(r, audio);
    }

    /// Decoded image for a handle, if it has arrived.
    pub fn image(&self, r: &AssetRef) -> Option<&PreparedImage> {
        self.images.get(r)
    }

    /// Decoded audio for a handle, if it has arrived.
    pub fn audio(&self, r: &AssetRef) -> Option<&PreparedAudio> {
        self.audio.get(r)
    }

    fn resolve_path(&self, r: &AssetRef) -> StoryResult<PathBuf> {
        let root = self.root.as_deref().ok_or_else(|| {
            StoryError::asset(format!("no asset root configured to resolve '{r}'"))
        })?;
        if r.as_str().contains("://") {
            return Err(StoryError::asset(format!(
                "remote asset handles are not fetched: '{r}'"
            )));
        }
        let norm = normalize_rel_path(r.as_str())?;
        Ok(root.join(Path::new(&norm)))
    }

    fn read_bytes(&self, r: &AssetRef) -> StoryResult<Vec<u8>> {
        let path = self.resolve_path(r)?;
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(StoryError::from)
    }
}

/// Normalize and validate project-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> StoryResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StoryError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(StoryError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StoryError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StoryError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
