use crate::{
    assets::store::AssetStore,
    foundation::config::TimingConfig,
    model::project::{AssetRef, Dialogue, Project},
    sequencer::cursor::{PlaybackCursor, dwell},
};

/// Identity of one entry into a line. Callbacks carry it so stale ones can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineToken(pub u64);

/// Sequencer state. Deadlines are absolute milliseconds on the host clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    /// Not advancing (initial, paused, stopped or rewound).
    Idle,
    /// Waiting for the current line's audio to end.
    PlayingAudio {
        /// Line entry the audio belongs to.
        token: LineToken,
    },
    /// Showing a line without playable audio until `until_ms`.
    Dwelling {
        /// Line entry being shown.
        token: LineToken,
        /// Deadline.
        until_ms: u64,
    },
    /// Pause after the last line of a scene.
    SceneTransition {
        /// Deadline.
        until_ms: u64,
    },
    /// Past the last scene.
    Finished,
}

impl SequencerState {
    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PlayingAudio { .. } => "playing_audio",
            Self::Dwelling { .. } => "dwelling",
            Self::SceneTransition { .. } => "scene_transition",
            Self::Finished => "finished",
        }
    }
}

/// Side effects requested by a transition, applied by the owner in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Connect the clip for `audio` to the audio graph under `token`.
    PlayAudio {
        /// Line entry.
        token: LineToken,
        /// Audio handle of the line.
        audio: AssetRef,
    },
    /// Disconnect whatever source is playing.
    StopAudio,
    /// Playback ran past the last scene.
    Finished,
}

/// Answers whether an audio handle can be played right now.
pub trait AudioLookup {
    /// `true` when the decoded clip for `audio` is available.
    fn has_audio(&self, audio: &AssetRef) -> bool;
}

impl AudioLookup for AssetStore {
    fn has_audio(&self, audio: &AssetRef) -> bool {
        self.audio(audio).is_some()
    }
}

/// Message-driven playback state machine.
///
/// Every operation takes the current time and returns the directives its transition requires.
/// Transport controls are ignored while a recording owns playback, and events whose token does
/// not match the current state are dropped.
#[derive(Clone, Debug)]
pub struct Sequencer {
    timing: TimingConfig,
    cursor: PlaybackCursor,
    state: SequencerState,
    next_token: u64,
}

impl Sequencer {
    /// Idle sequencer at `(0, 0)`.
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            cursor: PlaybackCursor::start(),
            state: SequencerState::Idle,
            next_token: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Snapshot of the cursor.
    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    /// Timing policy.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Line under the cursor, if the cursor is on one.
    pub fn active_line<'p>(&self, project: &'p Project) -> Option<&'p Dialogue> {
        project.dialogue(self.cursor.scene_index, self.cursor.dialogue_index)
    }

    /// Start or resume playback. Resuming restarts the line under the cursor; playing from
    /// `Finished` starts over at `(0, 0)`.
    pub fn play(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        if self.locked("play") || self.cursor.is_playing {
            return Vec::new();
        }
        self.start_playing(now_ms, project, lookup)
    }

    /// Freeze the cursor and stop audio.
    pub fn pause(&mut self) -> Vec<Directive> {
        if self.locked("pause") || !self.cursor.is_playing {
            return Vec::new();
        }
        self.halt()
    }

    /// Halt playback and return to the first line of the current scene.
    pub fn stop(&mut self) -> Vec<Directive> {
        if self.locked("stop") {
            return Vec::new();
        }
        let out = self.halt();
        self.cursor.dialogue_index = 0;
        self.state = SequencerState::Idle;
        out
    }

    /// Halt playback and move to `(0, 0)`.
    pub fn rewind(&mut self) -> Vec<Directive> {
        if self.locked("rewind") {
            return Vec::new();
        }
        let out = self.halt();
        self.cursor.scene_index = 0;
        self.cursor.dialogue_index = 0;
        self.state = SequencerState::Idle;
        out
    }

    /// Jump to the first line of scene `scene_index`. Playback continues there if it was running.
    pub fn seek_scene(
        &mut self,
        scene_index: usize,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        if self.locked("seek_scene") {
            return Vec::new();
        }
        if scene_index >= project.scene_count() {
            tracing::debug!(scene_index, "seek past last scene ignored");
            return Vec::new();
        }
        self.reposition(scene_index, 0, now_ms, project, lookup)
    }

    /// Jump to line `dialogue_index` of the current scene.
    pub fn seek_dialogue(
        &mut self,
        dialogue_index: usize,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        if self.locked("seek_dialogue") {
            return Vec::new();
        }
        let scene = self.cursor.scene_index;
        if project.dialogue(scene, dialogue_index).is_none() {
            tracing::debug!(scene, dialogue_index, "seek past last line ignored");
            return Vec::new();
        }
        self.reposition(scene, dialogue_index, now_ms, project, lookup)
    }

    /// Jump to the next scene, if there is one.
    pub fn next_scene(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        let next = self.cursor.scene_index + 1;
        self.seek_scene(next, now_ms, project, lookup)
    }

    /// Hand playback to a recording session: rewind to `(0, 0)` and start playing.
    pub fn begin_recording(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        let mut out = self.halt();
        self.cursor = PlaybackCursor {
            is_recording: true,
            ..PlaybackCursor::start()
        };
        out.extend(self.start_playing(now_ms, project, lookup));
        out
    }

    /// Release playback from a recording session; playback that is still running is paused.
    pub fn end_recording(&mut self) -> Vec<Directive> {
        self.cursor.is_recording = false;
        if self.cursor.is_playing {
            return self.halt();
        }
        Vec::new()
    }

    /// The audio of line entry `token` reached its end.
    pub fn audio_ended(
        &mut self,
        token: LineToken,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        if !self.is_current_audio(token) {
            tracing::debug!(?token, state = self.state.name(), "stale audio end ignored");
            return Vec::new();
        }
        self.advance_line(now_ms, project, lookup)
    }

    /// The audio of line entry `token` could not be played; the line counts as finished.
    pub fn audio_rejected(
        &mut self,
        token: LineToken,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        if !self.is_current_audio(token) {
            tracing::debug!(?token, "stale audio rejection ignored");
            return Vec::new();
        }
        tracing::warn!(
            scene = self.cursor.scene_index,
            line = self.cursor.dialogue_index,
            "line audio rejected; advancing"
        );
        self.advance_line(now_ms, project, lookup)
    }

    /// Fire every deadline due by `now_ms`. Each follow-up state starts at the deadline that
    /// produced it, so coarse ticks do not stretch the timeline.
    pub fn poll(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        let mut out = Vec::new();
        while self.cursor.is_playing {
            match self.state {
                SequencerState::Dwelling { until_ms, .. } if until_ms <= now_ms => {
                    out.extend(self.advance_line(until_ms, project, lookup));
                }
                SequencerState::SceneTransition { until_ms } if until_ms <= now_ms => {
                    out.extend(self.advance_scene(until_ms, project, lookup));
                }
                _ => break,
            }
        }
        out
    }

    fn locked(&self, op: &str) -> bool {
        if self.cursor.is_recording {
            tracing::debug!(op, "transport control ignored while recording");
            return true;
        }
        false
    }

    fn is_current_audio(&self, token: LineToken) -> bool {
        self.cursor.is_playing && self.state == SequencerState::PlayingAudio { token }
    }

    fn halt(&mut self) -> Vec<Directive> {
        let was_playing = self.cursor.is_playing;
        self.cursor.is_playing = false;
        if !matches!(self.state, SequencerState::Finished) {
            self.state = SequencerState::Idle;
        }
        if was_playing {
            tracing::debug!(
                scene = self.cursor.scene_index,
                line = self.cursor.dialogue_index,
                "playback halted"
            );
        }
        vec![Directive::StopAudio]
    }

    fn start_playing(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        if self.state == SequencerState::Finished {
            self.cursor.scene_index = 0;
            self.cursor.dialogue_index = 0;
        }
        self.cursor.is_playing = true;
        self.enter_line(now_ms, project, lookup)
    }

    fn reposition(
        &mut self,
        scene_index: usize,
        dialogue_index: usize,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        self.cursor.scene_index = scene_index;
        self.cursor.dialogue_index = dialogue_index;
        if !self.cursor.is_playing {
            self.state = SequencerState::Idle;
            return Vec::new();
        }
        let mut out = vec![Directive::StopAudio];
        out.extend(self.enter_line(now_ms, project, lookup));
        out
    }

    fn advance_line(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        self.cursor.dialogue_index += 1;
        self.enter_line(now_ms, project, lookup)
    }

    fn advance_scene(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        let next = self.cursor.scene_index + 1;
        if next >= project.scene_count() {
            return self.finish();
        }
        self.cursor.scene_index = next;
        self.cursor.dialogue_index = 0;
        self.enter_line(now_ms, project, lookup)
    }

    /// Entry decision for the line under the cursor.
    fn enter_line(
        &mut self,
        now_ms: u64,
        project: &Project,
        lookup: &dyn AudioLookup,
    ) -> Vec<Directive> {
        let (scene_index, dialogue_index) = self.cursor.position();
        let Some(scene) = project.scene(scene_index) else {
            return self.finish();
        };

        let Some(line) = scene.dialogues.get(dialogue_index) else {
            self.state = SequencerState::SceneTransition {
                until_ms: now_ms + self.timing.scene_pause_ms,
            };
            tracing::debug!(scene = scene_index, "scene transition");
            return Vec::new();
        };

        let token = self.issue_token();
        match &line.audio {
            Some(audio) if lookup.has_audio(audio) => {
                self.state = SequencerState::PlayingAudio { token };
                tracing::debug!(scene = scene_index, line = dialogue_index, "playing line audio");
                vec![Directive::PlayAudio {
                    token,
                    audio: audio.clone(),
                }]
            }
            audio => {
                if let Some(missing) = audio {
                    tracing::warn!(
                        asset = %missing,
                        scene = scene_index,
                        line = dialogue_index,
                        "line audio not available; dwelling instead"
                    );
                }
                let until_ms = now_ms + dwell(&line.text, &self.timing);
                self.state = SequencerState::Dwelling { token, until_ms };
                tracing::debug!(scene = scene_index, line = dialogue_index, until_ms, "dwelling");
                Vec::new()
            }
        }
    }

    fn finish(&mut self) -> Vec<Directive> {
        self.cursor.is_playing = false;
        self.state = SequencerState::Finished;
        tracing::debug!("playback finished");
        vec![Directive::StopAudio, Directive::Finished]
    }

    fn issue_token(&mut self) -> LineToken {
        self.next_token += 1;
        LineToken(self.next_token)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequencer/machine.rs"]
mod tests;
