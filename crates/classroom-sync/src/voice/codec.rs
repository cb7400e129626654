//! PCM conversion and the `audioData` wire payload.
//!
//! Frames travel as base64 (standard alphabet, padded) of little-endian
//! signed 16-bit mono samples.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use classroom_common::AudioError;

const SCALE: f32 = 32768.0;

/// f32 samples in [-1, 1] to i16, scaling by 32768 and clamping.
pub fn encode_block(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s * SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// i16 samples back to f32 by dividing by 32768.
pub fn decode_block(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().map(|s| *s as f32 / SCALE).collect()
}

pub fn encode_payload(pcm: &[i16]) -> String {
    let bytes: Vec<u8> = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

pub fn decode_payload(data: &str) -> Result<Vec<i16>, AudioError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| AudioError::Decode(format!("invalid base64: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(AudioError::Decode(format!(
            "odd PCM byte count: {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Captured block straight to the wire payload.
pub fn encode_frame(samples: &[f32]) -> String {
    encode_payload(&encode_block(samples))
}

/// Wire payload straight to playable samples.
pub fn decode_frame(data: &str) -> Result<Vec<f32>, AudioError> {
    decode_payload(data).map(|pcm| decode_block(&pcm))
}
