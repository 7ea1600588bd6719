use super::*;
use crate::encode::sink::AudioTrackConfig;

#[test]
fn temp_paths_sit_next_to_the_output() {
    let out = Path::new("renders/StoryReel_Movie_1.mp4");
    assert_eq!(
        video_tmp_path(out),
        PathBuf::from("renders/StoryReel_Movie_1.mp4.video.mp4")
    );
    assert_eq!(
        audio_tmp_path(out),
        PathBuf::from("renders/StoryReel_Movie_1.mp4.audio.f32le")
    );
}

#[test]
fn video_length_converts_to_sample_frames() {
    let fps = Fps::whole(30).unwrap();
    assert_eq!(video_len_in_sample_frames(0, fps, 48_000), 0);
    assert_eq!(video_len_in_sample_frames(30, fps, 48_000), 48_000);
    assert_eq!(video_len_in_sample_frames(1, fps, 48_000), 1_600);
}

#[test]
fn begin_rejects_odd_sizes_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let err = sink
        .begin(SinkConfig {
            width: 3,
            height: 2,
            fps: Fps::whole(30).unwrap(),
            audio: None,
            out_path: PathBuf::from("target/ffmpeg_unit/odd.mp4"),
        })
        .unwrap_err();
    assert!(matches!(err, StoryError::Validation(_)));
}

#[test]
fn end_without_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    assert!(sink.end().is_err());
}

#[test]
fn records_a_short_clip_with_audio() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let out = PathBuf::from("target/ffmpeg_unit/short.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    sink.begin(SinkConfig {
        width: 16,
        height: 8,
        fps: Fps::whole(30).unwrap(),
        audio: Some(AudioTrackConfig {
            sample_rate: 48_000,
            channels: 2,
        }),
        out_path: out.clone(),
    })
    .unwrap();
    let frame = FrameRGBA {
        width: 16,
        height: 8,
        data: vec![128; 16 * 8 * 4],
        premultiplied: true,
    };
    for i in 0..10 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    sink.push_audio(&vec![0.0; 1_000]).unwrap();
    sink.end().unwrap();

    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    assert!(!video_tmp_path(&out).exists());
    assert!(!audio_tmp_path(&out).exists());
}

#[test]
fn aborted_begin_deletes_the_audio_spool() {
    let out = PathBuf::from("target/ffmpeg_unit/aborted.mp4");
    ensure_parent_dir(&out).unwrap();
    let spool = audio_tmp_path(&out);
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    sink.audio_spool = Some(BufWriter::new(File::create(&spool).unwrap()));

    sink.discard_audio_spool(&out);
    assert!(sink.audio_spool.is_none());
    assert!(!spool.exists());

    // Nothing to discard is a no-op.
    sink.discard_audio_spool(&out);
}
