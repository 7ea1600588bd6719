use super::*;
use crate::encode::sink::InMemorySink;

fn cfg() -> SessionConfig {
    SessionConfig {
        canvas: Canvas {
            width: 4,
            height: 2,
        },
        fps: Fps::whole(30).unwrap(),
        audio: Some(AudioTrackConfig {
            sample_rate: 48_000,
            channels: 2,
        }),
        product_name: "StoryReel".to_owned(),
        container_ext: "mp4".to_owned(),
        output_dir: PathBuf::from("out"),
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 4,
        height: 2,
        data: vec![v; 32],
        premultiplied: true,
    }
}

#[test]
fn file_name_follows_product_movie_epoch_pattern() {
    assert_eq!(
        artifact_file_name("StoryReel", 1_700_000_000_123, "mp4"),
        "StoryReel_Movie_1700000000123.mp4"
    );
}

#[test]
fn slow_ticks_duplicate_frames_into_every_due_slot() {
    let sink = InMemorySink::new();
    let mut r = Recorder::new();
    r.start_session(Box::new(sink.clone()), &cfg(), 1_000, 42).unwrap();
    assert_eq!(r.frames_due(1_000), 1);

    r.capture_frame(1_000, &frame(1));
    r.capture_frame(1_010, &frame(2));
    assert_eq!(r.frames_due(1_010), 0);
    // 100 ms later slots 1..=3 are due.
    assert_eq!(r.frames_due(1_100), 3);
    r.capture_frame(1_100, &frame(3));
    r.capture_audio(&[0.5; 8]);

    let artifact = r.stop_session(1_100).unwrap();
    assert!(!r.is_active());
    assert_eq!(artifact.file_name, "StoryReel_Movie_42.mp4");
    assert_eq!(artifact.path, PathBuf::from("out/StoryReel_Movie_42.mp4"));
    assert_eq!(artifact.frames, 4);
    assert_eq!(artifact.audio_samples, 8);
    assert_eq!(artifact.duration_ms, 133);

    let c = sink.capture();
    let values: Vec<u8> = c.frames.iter().map(|(_, f)| f.data[0]).collect();
    assert_eq!(values, vec![1, 3, 3, 3]);
    assert_eq!(c.ends, 1);
}

#[test]
fn stop_holds_last_frame_until_stop_time() {
    let sink = InMemorySink::new();
    let mut r = Recorder::new();
    r.start_session(Box::new(sink.clone()), &cfg(), 0, 1).unwrap();
    r.capture_frame(0, &frame(7));
    let a = r.stop_session(1_000).unwrap();
    assert_eq!(a.frames, 31);
    assert_eq!(a.duration_ms, 1_033);
}

#[test]
fn failing_sink_surfaces_a_capture_error() {
    let mut r = Recorder::new();
    let err = r
        .start_session(Box::new(InMemorySink::failing()), &cfg(), 0, 1)
        .unwrap_err();
    assert!(matches!(err, StoryError::Capture(_)));
    assert!(!r.is_active());
}

#[test]
fn second_start_and_stop_without_session_are_rejected() {
    let mut r = Recorder::new();
    assert!(r.stop_session(0).is_err());
    r.start_session(Box::new(InMemorySink::new()), &cfg(), 0, 1).unwrap();
    assert!(r.start_session(Box::new(InMemorySink::new()), &cfg(), 0, 2).is_err());
    assert!(r.stop_session(10).is_ok());
    assert!(r.stop_session(20).is_err());
}
