use crate::{
    assets::store::AssetStore,
    encode::sink::MediaSink,
    foundation::{
        config::TimingConfig,
        core::{Fps, FrameIndex},
        error::{StoryError, StoryResult},
    },
    model::project::Project,
    player::controller::Player,
    recorder::session::RecordingArtifact,
    sequencer::cursor::dwell,
};

/// Extra virtual time allowed beyond the estimated duration before an export is cut short.
const EXPORT_SLACK_MS: u64 = 10_000;

/// Options for [`export`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ExportOptions {
    /// Hard limit on virtual time; defaults to the estimated duration plus slack.
    pub max_duration_ms: Option<u64>,
}

/// Playback length of `project`: audio clip lengths (or dwell times) plus scene pauses.
pub fn estimate_duration_ms(project: &Project, assets: &AssetStore, timing: &TimingConfig) -> u64 {
    project
        .scenes
        .iter()
        .map(|scene| {
            let lines: u64 = scene
                .dialogues
                .iter()
                .map(|d| {
                    match d.audio.as_ref().and_then(|r| assets.audio(r)) {
                        Some(clip) => clip.duration_ms().ceil() as u64,
                        None => dwell(&d.text, timing),
                    }
                })
                .sum();
            lines + timing.scene_pause_ms
        })
        .sum()
}

/// Record the whole project on a virtual clock, one tick per recorded frame.
///
/// The session starts at the player's current time and ends when playback finishes (or when
/// the time limit is hit, in which case the recording is stopped manually).
#[tracing::instrument(skip_all)]
pub fn export(
    player: &mut Player,
    sink: Box<dyn MediaSink>,
    opts: ExportOptions,
) -> StoryResult<RecordingArtifact> {
    let fps: Fps = player.config().fps()?;
    let limit = opts.max_duration_ms.unwrap_or_else(|| {
        estimate_duration_ms(player.project(), player.assets(), &player.config().timing)
            + EXPORT_SLACK_MS
    });

    let start = player.now_ms();
    player.start_recording(sink)?;

    let mut frame = 0u64;
    while player.is_recording() {
        // First millisecond at which `frame` is due.
        let t = fps.frame_to_ms(FrameIndex(frame)).ceil() as u64;
        if t > limit {
            tracing::warn!(limit_ms = limit, "export time limit reached; stopping recording");
            return player.stop_recording();
        }
        player.tick(start + t);
        frame += 1;
    }

    player
        .take_artifacts()
        .pop()
        .ok_or_else(|| StoryError::capture("recording ended without a finalized artifact"))
}

#[cfg(test)]
#[path = "../../tests/unit/player/offline.rs"]
mod tests;
