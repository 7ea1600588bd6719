/// Text measurement capability used by subtitle layout.
pub trait TextMeasure {
    /// Advance width of `text` rendered at `size_px`, in pixels.
    fn measure(&mut self, text: &str, size_px: f32) -> f64;
}

/// Approximate measurement: every char advances `em_ratio * size_px`.
///
/// Used when no font is configured and as a deterministic stand-in in tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Advance per char as a fraction of the font size.
    pub em_ratio: f64,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { em_ratio: 0.5 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&mut self, text: &str, size_px: f32) -> f64 {
        text.chars().count() as f64 * self.em_ratio * f64::from(size_px)
    }
}

/// Greedy word wrap.
///
/// Words are appended to the current line while the measured width stays within `max_width`;
/// on overflow the line is flushed and the word starts a new one. A word that is wider than
/// `max_width` on its own occupies a line by itself and is never broken.
pub fn wrap_greedy(
    text: &str,
    max_width: f64,
    size_px: f32,
    measure: &mut dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.measure(&candidate, size_px) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/text/wrap.rs"]
mod tests;
