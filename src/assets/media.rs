use std::path::Path;

use crate::foundation::error::{StoryError, StoryResult};

/// Sample rate of the shared audio graph and of recorded audio.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Decoded interleaved PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Vec<f32>,
}

/// Decode any ffmpeg-readable audio file to interleaved stereo `f32` at `sample_rate`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> StoryResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| StoryError::asset(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(StoryError::asset(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: f32le_bytes_to_samples(&out.stdout)?,
    })
}

/// Audio decoding is unavailable without the `media-ffmpeg` feature.
#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_audio_f32_stereo(_path: &Path, _sample_rate: u32) -> StoryResult<AudioPcm> {
    Err(StoryError::asset(
        "audio assets require the 'media-ffmpeg' feature",
    ))
}

/// Reinterpret little-endian `f32` bytes as samples.
pub fn f32le_bytes_to_samples(bytes: &[u8]) -> StoryResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(StoryError::asset(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Serialize samples as little-endian `f32` bytes (ffmpeg `-f f32le`).
pub fn samples_to_f32le_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::<u8>::with_capacity(samples.len() * 4);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Number of sample frames spanning `ms` at `sample_rate`, rounded to nearest.
pub fn ms_to_sample_frames(ms: u64, sample_rate: u32) -> u64 {
    let num = u128::from(ms) * u128::from(sample_rate);
    ((num + 500) / 1000) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
