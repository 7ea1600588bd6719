//! StoryReel plays, composites and records narrated, illustrated slideshows.
//!
//! A [`Project`] is an ordered list of scenes, each with an optional background image and a
//! list of dialogue lines with optional narration audio. The [`Player`] is driven by the host's
//! display refresh through [`Player::tick`]:
//!
//! - the sequencer advances line by line on audio end or a text-length dwell,
//! - every tick draws the background with a slow zoom/pan and the current subtitle,
//! - an active recording captures rendered frames and the mixed audio into a [`MediaSink`].
//!
//! [`export`] drives the same player on a virtual clock to produce a video file offline.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;
mod model;
mod text;

pub(crate) mod animation;
/// Audio graph and speaker outputs.
pub mod audio;
/// Recording sinks.
pub mod encode;
/// Playback controller and offline export.
pub mod player;
/// Recording sessions.
pub mod recorder;
/// Drawing surfaces, subtitles and frame composition.
pub mod render;
/// Line sequencing state machine.
pub mod sequencer;

pub use crate::animation::ken_burns::{Animator, SceneTransform, transform as scene_transform};
pub use crate::assets::decode::decode_image;
pub use crate::assets::media::MIX_SAMPLE_RATE;
pub use crate::assets::store::{AssetStore, PreparedAudio, PreparedImage};
pub use crate::foundation::config::{ENV_FONT, ENV_OUTPUT_DIR, PlayerConfig, TimingConfig};
pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{StoryError, StoryResult};
pub use crate::model::project::{AssetRef, Character, Dialogue, Project, Scene};
pub use crate::text::layout::TextLayoutEngine;
pub use crate::text::wrap::{FixedAdvance, TextMeasure, wrap_greedy};

pub use crate::audio::graph::AudioGraph;
pub use crate::audio::output::{AudioOutput, NullOutput};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{
    AudioTrackConfig, InMemoryCapture, InMemorySink, MediaSink, SinkConfig,
};
pub use crate::player::controller::Player;
pub use crate::player::offline::{ExportOptions, estimate_duration_ms, export};
pub use crate::recorder::session::{RecordingArtifact, artifact_file_name};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::frame::{FrameRGBA, FrameRenderer, FrameView};
pub use crate::render::subtitle::{SubtitleCompositor, SubtitleStyle};
pub use crate::render::surface::{DrawCommand, RecordingSurface, Surface, TextStyle};
pub use crate::sequencer::cursor::{PlaybackCursor, dwell};
pub use crate::sequencer::machine::{Directive, LineToken, Sequencer, SequencerState};
