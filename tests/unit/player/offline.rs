use std::sync::Arc;

use super::*;
use crate::{
    assets::store::PreparedAudio,
    encode::sink::InMemorySink,
    foundation::{config::PlayerConfig, core::Canvas},
    model::project::AssetRef,
};

fn small_config() -> PlayerConfig {
    PlayerConfig {
        canvas: Canvas {
            width: 48,
            height: 28,
        },
        ..PlayerConfig::default()
    }
}

fn one_silent_line() -> Project {
    Project::from_json_str(
        r#"{ "scenes": [ { "id": "s", "order": 0, "dialogues": [
            { "id": "d", "characterId": "c", "text": "0123456789" } ] } ] }"#,
    )
    .unwrap()
}

#[test]
fn estimate_sums_clips_dwells_and_scene_pauses() {
    let p = Project::from_json_str(
        r#"{ "scenes": [
            { "id": "a", "order": 0, "dialogues": [
                { "id": "a1", "characterId": "c", "text": "hi", "audioRef": "a1.wav" },
                { "id": "a2", "characterId": "c", "text": "hello" } ] },
            { "id": "b", "order": 1, "dialogues": [] }
        ] }"#,
    )
    .unwrap();
    let mut assets = AssetStore::new();
    assets.insert_audio(
        AssetRef::new("a1.wav"),
        PreparedAudio {
            sample_rate: 48_000,
            channels: 2,
            interleaved_f32: Arc::new(vec![0.0; 750 * 48 * 2]),
        },
    );
    let timing = TimingConfig::default();
    let expected = 750 + dwell("hello", &timing) + 2 * timing.scene_pause_ms;
    assert_eq!(estimate_duration_ms(&p, &assets, &timing), expected);
    assert_eq!(estimate_duration_ms(&Project::default(), &assets, &timing), 0);
}

#[test]
fn export_records_until_playback_finishes() {
    let sink = InMemorySink::new();
    let mut player = Player::new(one_silent_line(), AssetStore::new(), small_config()).unwrap();
    let artifact = export(&mut player, Box::new(sink.clone()), ExportOptions::default()).unwrap();

    // 2000 ms dwell plus a 1000 ms scene pause at 30 fps, frame 0 included.
    assert_eq!(artifact.frames, 91);
    assert!(!player.is_recording());
    assert!(player.take_artifacts().is_empty());

    let c = sink.capture();
    assert_eq!((c.begins, c.ends), (1, 1));
    assert_eq!(c.frames.len(), 91);
    let cfg = c.config.as_ref().unwrap();
    assert_eq!((cfg.width, cfg.height), (48, 28));
    assert!(!c.audio.is_empty());
}

#[test]
fn export_stops_at_the_time_limit() {
    let sink = InMemorySink::new();
    let mut player = Player::new(one_silent_line(), AssetStore::new(), small_config()).unwrap();
    let artifact = export(
        &mut player,
        Box::new(sink.clone()),
        ExportOptions {
            max_duration_ms: Some(1_000),
        },
    )
    .unwrap();
    assert_eq!(artifact.frames, 31);
    assert!(!player.is_recording());
    assert!(!player.is_playing());
    assert_eq!(sink.capture().ends, 1);
}

#[test]
fn export_propagates_sink_start_failure() {
    let mut player = Player::new(one_silent_line(), AssetStore::new(), small_config()).unwrap();
    let err = export(&mut player, Box::new(InMemorySink::failing()), ExportOptions::default())
        .unwrap_err();
    assert!(matches!(err, StoryError::Capture(_)));
}
