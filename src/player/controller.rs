use std::collections::VecDeque;

use crate::{
    animation::ken_burns::Animator,
    assets::store::AssetStore,
    audio::{
        graph::{AudioGraph, GRAPH_CHANNELS},
        output::{AudioOutput, NullOutput},
    },
    encode::sink::{AudioTrackConfig, MediaSink},
    foundation::{
        config::PlayerConfig,
        core::Rgba8,
        error::{StoryError, StoryResult},
    },
    model::project::{AssetRef, Dialogue, Project},
    recorder::session::{Recorder, RecordingArtifact, SessionConfig},
    render::{
        cpu::CpuSurface,
        draw_loop::DrawLoop,
        frame::{FrameRGBA, FrameRenderer, FrameView},
    },
    sequencer::{
        cursor::PlaybackCursor,
        machine::{Directive, Sequencer, SequencerState},
    },
    text::layout::TextLayoutEngine,
};

/// Playback, rendering and recording for one project.
///
/// The host drives the player with [`Player::tick`] on every display refresh, passing a
/// monotonic millisecond clock. Controls take effect at the time of the latest tick. Audio-end
/// events, dwell deadlines and control calls are all funnelled through the sequencer, and the
/// directives it returns are applied from a single work queue.
pub struct Player {
    config: PlayerConfig,
    project: Project,
    assets: AssetStore,
    sequencer: Sequencer,
    animator: Animator,
    renderer: FrameRenderer,
    surface: CpuSurface,
    draw_loop: DrawLoop,
    audio_output: Option<Box<dyn AudioOutput>>,
    audio: Option<AudioGraph>,
    audio_graphs_created: u32,
    recorder: Recorder,
    artifacts: Vec<RecordingArtifact>,
    last_frame: Option<FrameRGBA>,
    now_ms: u64,
    shut_down: bool,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("cursor", &self.sequencer.cursor())
            .field("state", &self.sequencer.state())
            .field("now_ms", &self.now_ms)
            .field("recorder", &self.recorder)
            .finish_non_exhaustive()
    }
}

impl Player {
    /// Build a player for `project`. Scenes are put into playback order by their `order`
    /// field; the cursor starts at `(0, 0)`, stopped.
    ///
    /// A configured font that fails to load is reported and subtitles fall back to
    /// approximate measurement without glyphs.
    pub fn new(
        mut project: Project,
        assets: AssetStore,
        config: PlayerConfig,
    ) -> StoryResult<Self> {
        config.validate()?;
        project.sort_scenes();
        project.validate()?;

        let mut surface = CpuSurface::new(config.canvas.width, config.canvas.height)?;
        if let Some(path) = config.font_path.as_deref() {
            match TextLayoutEngine::from_font_file(path) {
                Ok(engine) => surface.set_text_engine(engine),
                Err(e) => {
                    tracing::warn!(font = %path.display(), error = %e, "subtitle font unavailable")
                }
            }
        }
        let [r, g, b, a] = config.clear_rgba;
        let renderer = FrameRenderer::new(config.canvas, Rgba8::rgba(r, g, b, a));

        Ok(Self {
            sequencer: Sequencer::new(config.timing),
            config,
            project,
            assets,
            animator: Animator::new(),
            renderer,
            surface,
            draw_loop: DrawLoop::new(),
            audio_output: None,
            audio: None,
            audio_graphs_created: 0,
            recorder: Recorder::new(),
            artifacts: Vec::new(),
            last_frame: None,
            now_ms: 0,
            shut_down: false,
        })
    }

    /// Speaker output used when the audio graph is created. Defaults to [`NullOutput`].
    pub fn with_audio_output(mut self, output: Box<dyn AudioOutput>) -> Self {
        self.audio_output = Some(output);
        self
    }

    /// Shape subtitles with `engine`'s font.
    pub fn with_text_engine(mut self, engine: TextLayoutEngine) -> Self {
        self.surface.set_text_engine(engine);
        self
    }

    /// Index into the ordered scene list.
    pub fn current_scene_index(&self) -> usize {
        self.sequencer.cursor().scene_index
    }

    /// Index of the current line within its scene.
    pub fn current_dialogue_index(&self) -> usize {
        self.sequencer.cursor().dialogue_index
    }

    /// Whether lines are advancing.
    pub fn is_playing(&self) -> bool {
        self.sequencer.cursor().is_playing
    }

    /// Whether a recording session owns playback.
    pub fn is_recording(&self) -> bool {
        self.sequencer.cursor().is_recording
    }

    /// Sequencer state.
    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    /// Full cursor snapshot.
    pub fn cursor(&self) -> PlaybackCursor {
        self.sequencer.cursor()
    }

    /// Line under the cursor.
    pub fn active_line(&self) -> Option<&Dialogue> {
        self.sequencer.active_line(&self.project)
    }

    /// Project being played, scenes in playback order.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Decoded assets.
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Insert late-arriving decoded assets here; they are picked up when their line or scene
    /// becomes current.
    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    /// Active configuration.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Time of the latest tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Most recently drawn frame.
    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.last_frame.as_ref()
    }

    /// Draw-loop bookkeeping.
    pub fn draw_loop(&self) -> &DrawLoop {
        &self.draw_loop
    }

    /// Whether the shared audio graph currently exists.
    pub fn has_audio_graph(&self) -> bool {
        self.audio.is_some()
    }

    /// How many audio graphs this player has created (at most one).
    pub fn audio_graphs_created(&self) -> u32 {
        self.audio_graphs_created
    }

    /// Artifacts of sessions that finalized on their own, oldest first. Draining them is left
    /// to the host.
    pub fn take_artifacts(&mut self) -> Vec<RecordingArtifact> {
        std::mem::take(&mut self.artifacts)
    }

    /// Give a scene its background handle once it has been generated.
    pub fn attach_scene_background(&mut self, scene_id: &str, image: AssetRef) -> bool {
        self.project.set_scene_background(scene_id, image)
    }

    /// Give a line its audio handle once it has been generated.
    pub fn attach_dialogue_audio(
        &mut self,
        scene_id: &str,
        dialogue_id: &str,
        audio: AssetRef,
    ) -> bool {
        self.project.set_dialogue_audio(scene_id, dialogue_id, audio)
    }

    /// Start or resume playback.
    pub fn play(&mut self) {
        if self.shut_down {
            return;
        }
        let ds = self
            .sequencer
            .play(self.now_ms, &self.project, &self.assets);
        self.apply(ds);
    }

    /// Freeze the cursor and stop audio.
    pub fn pause(&mut self) {
        if self.shut_down {
            return;
        }
        let ds = self.sequencer.pause();
        self.apply(ds);
    }

    /// Halt playback and return to the first line of the current scene.
    pub fn stop(&mut self) {
        if self.shut_down {
            return;
        }
        let ds = self.sequencer.stop();
        self.apply(ds);
    }

    /// Halt playback and return to the first line of the first scene.
    pub fn rewind_to_start(&mut self) {
        if self.shut_down {
            return;
        }
        let ds = self.sequencer.rewind();
        self.animator.reset();
        self.apply(ds);
    }

    /// Jump to the next scene, if any.
    pub fn next_scene(&mut self) {
        if self.shut_down {
            return;
        }
        let ds = self
            .sequencer
            .next_scene(self.now_ms, &self.project, &self.assets);
        self.apply(ds);
    }

    /// Jump to the first line of scene `index`.
    pub fn seek_scene(&mut self, index: usize) {
        if self.shut_down {
            return;
        }
        let ds = self
            .sequencer
            .seek_scene(index, self.now_ms, &self.project, &self.assets);
        self.apply(ds);
    }

    /// Jump to line `index` of the current scene.
    pub fn seek_dialogue(&mut self, index: usize) {
        if self.shut_down {
            return;
        }
        let ds = self
            .sequencer
            .seek_dialogue(index, self.now_ms, &self.project, &self.assets);
        self.apply(ds);
    }

    /// Rewind, begin a recording session into `sink` and start playback.
    ///
    /// On failure the player is left stopped at `(0, 0)` and not recording.
    #[tracing::instrument(skip(self, sink))]
    pub fn start_recording(&mut self, sink: Box<dyn MediaSink>) -> StoryResult<()> {
        if self.shut_down {
            return Err(StoryError::capture("player has been shut down"));
        }
        if self.is_recording() {
            return Err(StoryError::capture("a recording is already in progress"));
        }

        let ds = self.sequencer.rewind();
        self.animator.reset();
        self.apply(ds);

        let cfg = SessionConfig {
            canvas: self.config.canvas,
            fps: self.config.fps()?,
            audio: Some(AudioTrackConfig {
                sample_rate: self.config.sample_rate,
                channels: GRAPH_CHANNELS,
            }),
            product_name: self.config.product_name.clone(),
            container_ext: self.config.container_ext.clone(),
            output_dir: self.config.output_dir.clone(),
        };
        self.recorder
            .start_session(sink, &cfg, self.now_ms, epoch_ms())?;

        self.graph().attach_capture();
        let ds = self
            .sequencer
            .begin_recording(self.now_ms, &self.project, &self.assets);
        self.apply(ds);
        Ok(())
    }

    /// Finalize the running session and pause playback.
    pub fn stop_recording(&mut self) -> StoryResult<RecordingArtifact> {
        if !self.recorder.is_active() {
            return Err(StoryError::capture("no recording is in progress"));
        }
        let result = self.finalize_recording();
        let ds = self.sequencer.end_recording();
        self.apply(ds);
        result
    }

    /// Advance to `now_ms`: pump audio, fire due deadlines, apply directives, then draw and
    /// capture if the draw loop is running. Returns the frame drawn by this tick.
    pub fn tick(&mut self, now_ms: u64) -> Option<&FrameRGBA> {
        if self.shut_down {
            return None;
        }
        if now_ms < self.now_ms {
            tracing::debug!(now_ms, last_ms = self.now_ms, "clock went backwards; holding");
        }
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let mut ds = Vec::new();
        if let Some(token) = self.audio.as_mut().and_then(|g| g.advance_to(now)) {
            ds.extend(
                self.sequencer
                    .audio_ended(token, now, &self.project, &self.assets),
            );
        }
        ds.extend(self.sequencer.poll(now, &self.project, &self.assets));
        self.apply(ds);

        if !self.draw_loop.is_running() {
            return None;
        }
        let frame = self.draw(now);
        if self.recorder.is_active() {
            let audio = self
                .audio
                .as_mut()
                .map(|g| g.drain_capture())
                .unwrap_or_default();
            self.recorder.capture_audio(&audio);
            self.recorder.capture_frame(now, &frame);
        }
        self.last_frame = Some(frame);
        self.last_frame.as_ref()
    }

    /// Render scene `scene_index` at `elapsed_ms` into its animation, with line `line` subtitled
    /// when given. Does not touch playback state.
    pub fn render_still(
        &mut self,
        scene_index: usize,
        elapsed_ms: f64,
        line: Option<usize>,
    ) -> StoryResult<FrameRGBA> {
        if self.project.scene(scene_index).is_none() {
            return Err(StoryError::validation(format!(
                "scene index {scene_index} is out of range (project has {})",
                self.project.scene_count()
            )));
        }
        let line = match line {
            Some(i) => Some(self.project.dialogue(scene_index, i).ok_or_else(|| {
                StoryError::validation(format!("line {i} of scene {scene_index} does not exist"))
            })?),
            None => None,
        };
        self.surface.begin_frame();
        self.renderer.render(
            &mut self.surface,
            &FrameView {
                project: &self.project,
                assets: &self.assets,
                scene_index,
                line,
                elapsed_ms,
            },
        );
        Ok(self.surface.finish_frame())
    }

    /// Release the draw loop, the audio graph and any capture tap. A running recording is
    /// finalized best-effort and its artifact kept for [`Player::take_artifacts`].
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        if self.recorder.is_active() {
            match self.finalize_recording() {
                Ok(artifact) => self.artifacts.push(artifact),
                Err(e) => tracing::warn!(error = %e, "recording aborted during shutdown"),
            }
        }
        let mut ds = self.sequencer.end_recording();
        ds.extend(self.sequencer.pause());
        self.apply(ds);
        self.draw_loop.stop();
        if let Some(mut graph) = self.audio.take() {
            graph.disconnect();
            graph.detach_capture();
        }
        self.shut_down = true;
        tracing::debug!("player shut down");
    }

    fn draw(&mut self, now: u64) -> FrameRGBA {
        let scene_index = self.current_scene_index();
        let elapsed_ms = self.animator.observe(scene_index, now);
        let line = self.sequencer.active_line(&self.project);
        self.surface.begin_frame();
        self.renderer.render(
            &mut self.surface,
            &FrameView {
                project: &self.project,
                assets: &self.assets,
                scene_index,
                line,
                elapsed_ms,
            },
        );
        self.surface.finish_frame()
    }

    fn graph(&mut self) -> &mut AudioGraph {
        let rate = self.config.sample_rate;
        let now = self.now_ms;
        let output = &mut self.audio_output;
        let created = &mut self.audio_graphs_created;
        self.audio.get_or_insert_with(|| {
            *created += 1;
            tracing::debug!(sample_rate = rate, "audio graph created");
            let mut graph = AudioGraph::new(
                rate,
                output.take().unwrap_or_else(|| Box::new(NullOutput::new())),
            );
            // Start the graph clock now so the first clip is not delayed by a tick.
            graph.advance_to(now);
            graph
        })
    }

    fn finalize_recording(&mut self) -> StoryResult<RecordingArtifact> {
        let tail = match self.audio.as_mut() {
            Some(g) => g.detach_capture(),
            None => Vec::new(),
        };
        self.recorder.capture_audio(&tail);
        self.recorder.stop_session(self.now_ms)
    }

    fn apply(&mut self, directives: Vec<Directive>) {
        let now = self.now_ms;
        let mut queue: VecDeque<Directive> = directives.into();
        while let Some(d) = queue.pop_front() {
            match d {
                Directive::StopAudio => {
                    if let Some(g) = self.audio.as_mut() {
                        g.disconnect();
                    }
                }
                Directive::PlayAudio { token, audio } => {
                    let connected = match self.assets.audio(&audio).cloned() {
                        Some(clip) => self.graph().connect(&clip, token),
                        None => Err(StoryError::asset(format!("audio '{audio}' is not loaded"))),
                    };
                    if let Err(e) = connected {
                        tracing::warn!(asset = %audio, error = %e, "line audio could not start");
                        queue.extend(self.sequencer.audio_rejected(
                            token,
                            now,
                            &self.project,
                            &self.assets,
                        ));
                    }
                }
                Directive::Finished => {
                    if self.recorder.is_active() {
                        match self.finalize_recording() {
                            Ok(artifact) => self.artifacts.push(artifact),
                            Err(e) => tracing::warn!(error = %e, "recording finalization failed"),
                        }
                        queue.extend(self.sequencer.end_recording());
                    }
                }
            }
        }
        self.sync_draw_loop();
    }

    fn sync_draw_loop(&mut self) {
        let playing = self.sequencer.cursor().is_playing;
        if playing && !self.draw_loop.is_running() {
            self.draw_loop.start();
        } else if !playing && self.draw_loop.is_running() {
            self.draw_loop.stop();
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/player/controller.rs"]
mod tests;
