use crate::{
    animation::ken_burns,
    assets::store::AssetStore,
    foundation::{
        core::{Canvas, Rgba8},
        math::flatten_premul_over_bg,
    },
    model::project::{Dialogue, Project},
    render::{subtitle::SubtitleCompositor, surface::Surface},
};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are premultiplied alpha; the flag makes that explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy composited over an opaque `bg_rgba`, as written to PNG or video.
    pub fn opaque_rgba8(&self, bg_rgba: [u8; 4]) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = vec![0u8; self.data.len()];
        flatten_premul_over_bg(&mut out, &self.data, bg_rgba);
        out
    }
}

/// Everything one frame depends on.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    /// Project being played.
    pub project: &'a Project,
    /// Decoded assets.
    pub assets: &'a AssetStore,
    /// Index into the ordered scene list.
    pub scene_index: usize,
    /// Line whose subtitle is shown; `None` draws the background only.
    pub line: Option<&'a Dialogue>,
    /// Time since the scene became visible, driving the Ken Burns motion.
    pub elapsed_ms: f64,
}

/// Draws the animated scene background and, when a line is current, its subtitle.
#[derive(Clone, Debug)]
pub struct FrameRenderer {
    canvas: Canvas,
    clear: Rgba8,
    subtitles: SubtitleCompositor,
}

impl FrameRenderer {
    /// Renderer for a fixed logical canvas.
    pub fn new(canvas: Canvas, clear: Rgba8) -> Self {
        Self {
            canvas,
            clear,
            subtitles: SubtitleCompositor::default(),
        }
    }

    /// Logical canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Draw one frame. A scene without a decoded background leaves the cleared canvas.
    pub fn render(&self, surface: &mut dyn Surface, view: &FrameView<'_>) {
        surface.clear(self.clear);

        let scene = view.project.scene(view.scene_index);
        let background = scene
            .and_then(|s| s.background_image.as_ref())
            .and_then(|r| view.assets.image(r));
        if let Some(image) = background {
            surface.save();
            surface.transform(ken_burns::transform(view.elapsed_ms).to_affine(self.canvas));
            surface.draw_image(image, self.canvas.rect());
            surface.restore();
        }

        if let Some(line) = view.line {
            let speaker = view.project.speaker_name(&line.character_id);
            self.subtitles.compose(surface, &line.text, speaker);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
