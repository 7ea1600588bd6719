//! Caption box, speaker name and wrapped dialogue drawn over the bottom of the canvas.

use crate::{
    foundation::core::{Point, Rect, Rgba8},
    render::surface::{Surface, TextStyle},
    text::wrap::wrap_greedy,
};

/// Geometry and colours of the subtitle overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubtitleStyle {
    /// Box width as a fraction of the surface width.
    pub box_width_ratio: f64,
    /// Distance from the bottom edge to the box top.
    pub box_top_from_bottom: f64,
    /// Box height.
    pub box_height: f64,
    /// Corner radius.
    pub box_radius: f64,
    /// Box fill.
    pub box_color: Rgba8,
    /// Left edge of speaker and dialogue text as a fraction of the surface width.
    pub text_left_ratio: f64,
    /// Distance from the bottom edge to the speaker name top.
    pub speaker_top_from_bottom: f64,
    /// Speaker name style.
    pub speaker: TextStyle,
    /// Distance from the bottom edge to the first dialogue line top.
    pub text_top_from_bottom: f64,
    /// Wrap width as a fraction of the surface width.
    pub wrap_width_ratio: f64,
    /// Vertical advance between dialogue lines.
    pub line_height: f64,
    /// Dialogue text style.
    pub text: TextStyle,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            box_width_ratio: 0.8,
            box_top_from_bottom: 140.0,
            box_height: 120.0,
            box_radius: 16.0,
            box_color: Rgba8::rgba(0, 0, 0, 179),
            text_left_ratio: 0.15,
            speaker_top_from_bottom: 125.0,
            speaker: TextStyle {
                size_px: 24.0,
                color: Rgba8::rgb(0xFB, 0xBF, 0x24),
            },
            text_top_from_bottom: 90.0,
            wrap_width_ratio: 0.7,
            line_height: 36.0,
            text: TextStyle {
                size_px: 28.0,
                color: Rgba8::WHITE,
            },
        }
    }
}

/// Draws the subtitle overlay for one dialogue line.
#[derive(Clone, Debug, Default)]
pub struct SubtitleCompositor {
    style: SubtitleStyle,
}

impl SubtitleCompositor {
    /// Bounds of the caption box on a `width`x`height` surface.
    pub fn box_rect(&self, width: f64, height: f64) -> Rect {
        let w = width * self.style.box_width_ratio;
        let x = (width - w) / 2.0;
        let y = height - self.style.box_top_from_bottom;
        Rect::new(x, y, x + w, y + self.style.box_height)
    }

    /// Draw the box, the uppercased speaker name and the wrapped dialogue text.
    pub fn compose(&self, surface: &mut dyn Surface, dialogue_text: &str, speaker_name: &str) {
        let s = &self.style;
        let (w, h) = surface.size();
        let (w, h) = (f64::from(w), f64::from(h));

        let bounds = self.box_rect(w, h);
        if !surface.fill_rounded_rect(bounds, s.box_radius, s.box_color) {
            surface.fill_rect(bounds, s.box_color);
        }

        let left = w * s.text_left_ratio;
        surface.fill_text(
            &speaker_name.to_uppercase(),
            Point::new(left, h - s.speaker_top_from_bottom),
            &s.speaker,
        );

        let lines = wrap_greedy(
            dialogue_text,
            w * s.wrap_width_ratio,
            s.text.size_px,
            &mut *surface,
        );
        for (i, line) in lines.iter().enumerate() {
            let y = h - s.text_top_from_bottom + (i as f64) * s.line_height;
            surface.fill_text(line, Point::new(left, y), &s.text);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/subtitle.rs"]
mod tests;
