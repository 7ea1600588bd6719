use crate::{
    assets::store::PreparedImage,
    foundation::core::{Affine, Point, Rect, Rgba8},
    text::wrap::{FixedAdvance, TextMeasure},
};

/// Font size and colour for a run of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Straight-alpha fill colour.
    pub color: Rgba8,
}

/// Raster drawing target used by the frame renderer and subtitle compositor.
///
/// Coordinates are logical canvas pixels. `transform` post-multiplies the current transform
/// (`current = current * affine`), and `save`/`restore` push and pop it.
pub trait Surface: TextMeasure {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);
    /// Fill the whole surface with `color`, ignoring the current transform.
    fn clear(&mut self, color: Rgba8);
    /// Push the current transform.
    fn save(&mut self);
    /// Pop the transform pushed by the matching `save`.
    fn restore(&mut self);
    /// Compose `affine` onto the current transform.
    fn transform(&mut self, affine: Affine);
    /// Draw `image` stretched into `dst`.
    fn draw_image(&mut self, image: &PreparedImage, dst: Rect);
    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8);
    /// Fill a rounded rectangle. Returns `false` when the surface has no such primitive.
    fn fill_rounded_rect(&mut self, _rect: Rect, _radius: f64, _color: Rgba8) -> bool {
        false
    }
    /// Draw one line of text whose layout box has its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle);
}

/// One call recorded by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// `clear`.
    Clear(Rgba8),
    /// `draw_image`, with the transform active at the time.
    Image {
        /// Image size in pixels.
        size: (u32, u32),
        /// Destination rectangle.
        dst: Rect,
        /// Transform in effect.
        transform: Affine,
    },
    /// `fill_rect`.
    Rect(Rect, Rgba8),
    /// Successful `fill_rounded_rect`.
    RoundedRect(Rect, f64, Rgba8),
    /// `fill_text`.
    Text {
        /// Text drawn.
        text: String,
        /// Top-left of the text box.
        origin: Point,
        /// Style used.
        style: TextStyle,
    },
}

/// Display-list surface that records draw calls instead of rasterizing them.
///
/// Text is measured with [`FixedAdvance`], so layouts are deterministic without a font.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    rounded_rects: bool,
    measure: FixedAdvance,
    current: Affine,
    stack: Vec<Affine>,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// Surface of the given size supporting rounded rectangles.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rounded_rects: true,
            measure: FixedAdvance::default(),
            current: Affine::IDENTITY,
            stack: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Toggle the rounded-rectangle primitive.
    pub fn with_rounded_rects(mut self, enabled: bool) -> Self {
        self.rounded_rects = enabled;
        self
    }

    /// Commands recorded so far.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Current save depth; zero when saves and restores are balanced.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }
}

impl TextMeasure for RecordingSurface {
    fn measure(&mut self, text: &str, size_px: f32) -> f64 {
        self.measure.measure(text, size_px)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba8) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        self.current = self.stack.pop().unwrap_or(Affine::IDENTITY);
    }

    fn transform(&mut self, affine: Affine) {
        self.current *= affine;
    }

    fn draw_image(&mut self, image: &PreparedImage, dst: Rect) {
        self.commands.push(DrawCommand::Image {
            size: (image.width, image.height),
            dst,
            transform: self.current,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.commands.push(DrawCommand::Rect(rect, color));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Rgba8) -> bool {
        if !self.rounded_rects {
            return false;
        }
        self.commands
            .push(DrawCommand::RoundedRect(rect, radius, color));
        true
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            origin,
            style: *style,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
