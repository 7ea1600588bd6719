use std::collections::HashSet;

use super::*;

#[derive(Default)]
struct Available(HashSet<String>);

impl AudioLookup for Available {
    fn has_audio(&self, audio: &AssetRef) -> bool {
        self.0.contains(audio.as_str())
    }
}

fn project(json: &str) -> Project {
    Project::from_json_str(json).unwrap()
}

fn two_scenes_silent() -> Project {
    project(
        r#"{ "scenes": [
            { "id": "b", "order": 2, "dialogues": [
                { "id": "b1", "characterId": "c", "text": "third" } ] },
            { "id": "a", "order": 1, "dialogues": [
                { "id": "a1", "characterId": "c", "text": "first" },
                { "id": "a2", "characterId": "c", "text": "second" } ] }
        ] }"#,
    )
}

fn with_audio() -> Project {
    project(
        r#"{ "scenes": [ { "id": "s", "order": 0, "dialogues": [
            { "id": "d1", "characterId": "c", "text": "one", "audioRef": "one.wav" },
            { "id": "d2", "characterId": "c", "text": "two", "audioRef": "two.wav" }
        ] } ] }"#,
    )
}

fn lookup(refs: &[&str]) -> Available {
    Available(refs.iter().map(|s| s.to_string()).collect())
}

fn play_token(ds: &[Directive]) -> LineToken {
    ds.iter()
        .find_map(|d| match d {
            Directive::PlayAudio { token, .. } => Some(*token),
            _ => None,
        })
        .expect("PlayAudio directive")
}

#[test]
fn single_silent_line_finishes_after_dwell_and_scene_pause() {
    let p = project(
        r#"{ "scenes": [ { "id": "s", "order": 0, "dialogues": [
            { "id": "d", "characterId": "c", "text": "0123456789" } ] } ] }"#,
    );
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());

    assert!(s.play(0, &p, &l).is_empty());
    assert_eq!(
        s.state(),
        SequencerState::Dwelling {
            token: LineToken(1),
            until_ms: 2000
        }
    );
    assert!(s.poll(1999, &p, &l).is_empty());
    assert!(s.poll(2000, &p, &l).is_empty());
    assert_eq!(s.state(), SequencerState::SceneTransition { until_ms: 3000 });
    assert!(s.poll(2999, &p, &l).is_empty());
    assert_eq!(
        s.poll(3000, &p, &l),
        vec![Directive::StopAudio, Directive::Finished]
    );
    assert_eq!(s.state(), SequencerState::Finished);
    assert!(!s.cursor().is_playing);
}

#[test]
fn coarse_poll_fires_chained_deadlines_at_their_own_times() {
    let p = project(
        r#"{ "scenes": [ { "id": "s", "order": 0, "dialogues": [
            { "id": "d", "characterId": "c", "text": "0123456789" } ] } ] }"#,
    );
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);
    let out = s.poll(10_000, &p, &l);
    assert_eq!(out, vec![Directive::StopAudio, Directive::Finished]);
}

#[test]
fn scenes_are_visited_in_order_field_order() {
    let p = two_scenes_silent();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);

    let mut visited = vec![s.cursor().position()];
    let mut now = 0;
    while s.state() != SequencerState::Finished {
        now += 100;
        s.poll(now, &p, &l);
        if let Some(line) = s.active_line(&p) {
            let pos = s.cursor().position();
            if visited.last() != Some(&pos) {
                visited.push(pos);
            }
            assert_eq!(p.dialogue(pos.0, pos.1), Some(line));
        }
    }
    assert_eq!(visited, vec![(0, 0), (0, 1), (1, 0)]);
    assert_eq!(p.scenes[0].id, "a");
    // 3 dwells of 2000 ms plus 2 scene pauses of 1000 ms.
    assert_eq!(now, 8000);
}

#[test]
fn audio_line_advances_on_matching_end_only() {
    let p = with_audio();
    let l = lookup(&["one.wav", "two.wav"]);
    let mut s = Sequencer::new(TimingConfig::default());

    let t1 = play_token(&s.play(0, &p, &l));
    assert_eq!(s.state(), SequencerState::PlayingAudio { token: t1 });

    assert!(s.audio_ended(LineToken(99), 10, &p, &l).is_empty());
    assert_eq!(s.cursor().position(), (0, 0));

    let t2 = play_token(&s.audio_ended(t1, 500, &p, &l));
    assert_ne!(t1, t2);
    assert_eq!(s.cursor().position(), (0, 1));

    // A repeated end for the first line is stale.
    assert!(s.audio_ended(t1, 600, &p, &l).is_empty());
    assert_eq!(s.cursor().position(), (0, 1));
}

#[test]
fn unresolvable_audio_dwells_instead_of_stalling() {
    let p = with_audio();
    let l = lookup(&["two.wav"]);
    let mut s = Sequencer::new(TimingConfig::default());
    assert!(s.play(0, &p, &l).is_empty());
    assert!(matches!(s.state(), SequencerState::Dwelling { until_ms: 2000, .. }));
    let out = s.poll(2000, &p, &l);
    assert!(matches!(
        out.as_slice(),
        [Directive::PlayAudio { audio, .. }] if audio.as_str() == "two.wav"
    ));
}

#[test]
fn rejected_audio_counts_as_finished_line() {
    let p = with_audio();
    let l = lookup(&["one.wav", "two.wav"]);
    let mut s = Sequencer::new(TimingConfig::default());
    let t1 = play_token(&s.play(0, &p, &l));
    s.audio_rejected(t1, 5, &p, &l);
    assert_eq!(s.cursor().position(), (0, 1));
}

#[test]
fn pause_and_resume_keep_the_same_line() {
    let p = two_scenes_silent();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);
    s.poll(2000, &p, &l);
    assert_eq!(s.cursor().position(), (0, 1));

    assert_eq!(s.pause(), vec![Directive::StopAudio]);
    assert_eq!(s.state(), SequencerState::Idle);
    // Deadlines are discarded while paused.
    assert!(s.poll(60_000, &p, &l).is_empty());
    assert_eq!(s.cursor().position(), (0, 1));

    s.play(60_000, &p, &l);
    assert_eq!(s.cursor().position(), (0, 1));
    assert!(matches!(s.state(), SequencerState::Dwelling { until_ms: 62_000, .. }));
    assert_eq!(s.active_line(&p).map(|d| d.id.as_str()), Some("a2"));
}

#[test]
fn pause_invalidates_the_playing_token() {
    let p = with_audio();
    let l = lookup(&["one.wav", "two.wav"]);
    let mut s = Sequencer::new(TimingConfig::default());
    let t1 = play_token(&s.play(0, &p, &l));
    s.pause();
    assert!(s.audio_ended(t1, 100, &p, &l).is_empty());
    let t1b = play_token(&s.play(200, &p, &l));
    assert_ne!(t1, t1b);
    assert_eq!(s.cursor().position(), (0, 0));
}

#[test]
fn empty_scene_goes_straight_to_transition() {
    let p = project(
        r#"{ "scenes": [
            { "id": "e", "order": 0, "dialogues": [] },
            { "id": "f", "order": 1, "dialogues": [ { "id": "x", "characterId": "c", "text": "hi" } ] }
        ] }"#,
    );
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);
    assert_eq!(s.state(), SequencerState::SceneTransition { until_ms: 1000 });
    s.poll(1000, &p, &l);
    assert_eq!(s.cursor().position(), (1, 0));
}

#[test]
fn empty_project_finishes_immediately() {
    let p = Project::default();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    assert_eq!(s.play(0, &p, &l), vec![Directive::StopAudio, Directive::Finished]);
    assert_eq!(s.state(), SequencerState::Finished);
}

#[test]
fn play_after_finish_starts_over() {
    let p = two_scenes_silent();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);
    s.poll(100_000, &p, &l);
    assert_eq!(s.state(), SequencerState::Finished);
    s.play(100_000, &p, &l);
    assert_eq!(s.cursor().position(), (0, 0));
    assert!(s.cursor().is_playing);
}

#[test]
fn transport_is_locked_while_recording() {
    let p = two_scenes_silent();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);
    s.poll(2000, &p, &l);

    s.begin_recording(2500, &p, &l);
    let before = (s.cursor(), s.state());
    assert_eq!(before.0.position(), (0, 0));
    assert!(before.0.is_recording && before.0.is_playing);

    assert!(s.pause().is_empty());
    assert!(s.stop().is_empty());
    assert!(s.rewind().is_empty());
    assert!(s.play(2600, &p, &l).is_empty());
    assert!(s.seek_scene(1, 2600, &p, &l).is_empty());
    assert!(s.seek_dialogue(1, 2600, &p, &l).is_empty());
    assert!(s.next_scene(2600, &p, &l).is_empty());
    assert_eq!((s.cursor(), s.state()), before);

    s.end_recording();
    assert!(!s.cursor().is_recording);
    assert!(!s.cursor().is_playing);
}

#[test]
fn seeks_reposition_and_reenter_while_playing() {
    let p = two_scenes_silent();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());

    s.seek_scene(1, 0, &p, &l);
    assert_eq!(s.cursor().position(), (1, 0));
    assert_eq!(s.state(), SequencerState::Idle);
    assert!(s.seek_scene(5, 0, &p, &l).is_empty());
    assert_eq!(s.cursor().position(), (1, 0));

    s.rewind();
    s.play(0, &p, &l);
    let out = s.seek_dialogue(1, 700, &p, &l);
    assert_eq!(out, vec![Directive::StopAudio]);
    assert!(matches!(s.state(), SequencerState::Dwelling { until_ms: 2700, .. }));

    s.next_scene(800, &p, &l);
    assert_eq!(s.cursor().position(), (1, 0));
    assert!(s.next_scene(900, &p, &l).is_empty());
    assert_eq!(s.cursor().position(), (1, 0));
}

#[test]
fn stop_returns_to_scene_start_and_rewind_to_origin() {
    let p = two_scenes_silent();
    let l = Available::default();
    let mut s = Sequencer::new(TimingConfig::default());
    s.play(0, &p, &l);
    s.poll(2000, &p, &l);
    s.stop();
    assert_eq!(s.cursor().position(), (0, 0));
    assert!(!s.cursor().is_playing);

    s.seek_scene(1, 0, &p, &l);
    s.rewind();
    assert_eq!(s.cursor().position(), (0, 0));
    assert_eq!(s.state(), SequencerState::Idle);
}
