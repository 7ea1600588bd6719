use super::*;

#[test]
fn f32le_bytes_round_trip() {
    let samples = vec![0.0f32, -1.0, 0.5, 0.25];
    let bytes = samples_to_f32le_bytes(&samples);
    assert_eq!(bytes.len(), 16);
    assert_eq!(f32le_bytes_to_samples(&bytes).unwrap(), samples);
}

#[test]
fn misaligned_pcm_is_rejected() {
    assert!(f32le_bytes_to_samples(&[0u8, 1, 2]).is_err());
}

#[test]
fn ms_to_sample_frames_rounds_to_nearest() {
    assert_eq!(ms_to_sample_frames(1000, 48_000), 48_000);
    assert_eq!(ms_to_sample_frames(16, 48_000), 768);
    assert_eq!(ms_to_sample_frames(1, 44_100), 44);
    assert_eq!(ms_to_sample_frames(0, 48_000), 0);
}
