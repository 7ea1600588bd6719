use crate::foundation::config::TimingConfig;

/// Position and mode of playback. Only the sequencer mutates it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    /// Index into the ordered scene list.
    pub scene_index: usize,
    /// Index into the current scene's lines; equal to the line count while between scenes.
    pub dialogue_index: usize,
    /// Whether lines are advancing.
    pub is_playing: bool,
    /// Whether a recording session owns playback.
    pub is_recording: bool,
}

impl PlaybackCursor {
    /// `(0, 0)`, stopped, not recording.
    pub fn start() -> Self {
        Self::default()
    }

    /// Position as `(scene_index, dialogue_index)`.
    pub fn position(&self) -> (usize, usize) {
        (self.scene_index, self.dialogue_index)
    }
}

/// On-screen time of a line without audio: `max(floor, per_char * chars(text))`.
pub fn dwell(text: &str, timing: &TimingConfig) -> u64 {
    let chars = text.chars().count() as u64;
    timing
        .dwell_floor_ms
        .max(timing.dwell_per_char_ms.saturating_mul(chars))
}

#[cfg(test)]
#[path = "../../tests/unit/sequencer/cursor.rs"]
mod tests;
