//! PCM16 framing between float sample buffers and base64 media payloads.

use base64::{engine::general_purpose, Engine as _};

use crate::domain::errors::LiveError;

/// Microphone capture rate sent upstream
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;
/// Rate of synthesized speech coming back
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;
/// Samples per capture frame
pub const CAPTURE_FRAME_LEN: usize = 4096;

const SCALE: f32 = 32768.0;

/// f32 in [-1, 1] -> little-endian PCM16 -> base64. Out of range input saturates.
pub fn encode_pcm16(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let scaled = (sample * SCALE).clamp(i16::MIN as f32, i16::MAX as f32);
        bytes.extend_from_slice(&(scaled as i16).to_le_bytes());
    }
    general_purpose::STANDARD.encode(bytes)
}

/// base64 -> little-endian PCM16 -> f32 (`/ 32768`)
pub fn decode_pcm16(data: &str) -> Result<Vec<f32>, LiveError> {
    let bytes = general_purpose::STANDARD
        .decode(data)
        .map_err(|e| LiveError::InvalidAudio(format!("bad base64: {}", e)))?;
    if bytes.len() % 2 != 0 {
        return Err(LiveError::InvalidAudio(format!(
            "odd byte count {} for 16-bit samples",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / SCALE)
        .collect())
}

/// Seconds of audio in `samples` at `sample_rate`
pub fn duration_secs(samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / sample_rate as f64
}
