use super::*;

#[test]
fn dwell_has_a_two_second_floor() {
    let t = TimingConfig::default();
    assert_eq!(dwell("", &t), 2000);
    assert_eq!(dwell("0123456789", &t), 2000);
    assert_eq!(dwell(&"x".repeat(40), &t), 2000);
    assert_eq!(dwell(&"x".repeat(41), &t), 2050);
    assert_eq!(dwell(&"x".repeat(100), &t), 5000);
}

#[test]
fn dwell_is_monotonic_in_length() {
    let t = TimingConfig::default();
    let mut prev = 0;
    for n in 0..200 {
        let d = dwell(&"a".repeat(n), &t);
        assert!(d >= prev);
        assert!(d >= 2000);
        prev = d;
    }
}

#[test]
fn dwell_counts_chars_not_bytes() {
    let t = TimingConfig::default();
    assert_eq!(dwell(&"é".repeat(50), &t), 2500);
}

#[test]
fn cursor_starts_at_origin() {
    let c = PlaybackCursor::start();
    assert_eq!(c.position(), (0, 0));
    assert!(!c.is_playing && !c.is_recording);
}
