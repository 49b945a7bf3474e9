//! WAV encoding and decoding for Aural
//!
//! Converts between in-memory WAV bytes and [`DecodedBuffer`]. Everything
//! happens on byte slices; sounds reach the engine as payloads, not paths.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::DecodedBuffer;
use crate::error::{AuralError, Result};

/// Maximum channel count accepted by the decoder
const MAX_CHANNELS: u16 = 8;

/// Decode WAV bytes into a buffer
///
/// # Errors
/// * `DecodeFailed` - If the bytes are not a readable WAV stream
/// * `UnsupportedFormat` - For bit depths or channel counts we do not handle
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedBuffer> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| AuralError::DecodeFailed {
        reason: format!("Failed to read WAV header: {}", e),
    })?;

    let spec = reader.spec();
    if spec.channels == 0 || spec.channels > MAX_CHANNELS {
        return Err(AuralError::UnsupportedFormat {
            format: format!("{}-channel audio", spec.channels),
        });
    }

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(AuralError::DecodeFailed {
            reason: "WAV stream contains no samples".to_string(),
        });
    }

    Ok(DecodedBuffer::from_interleaved(
        spec.sample_rate,
        spec.channels as usize,
        &interleaved,
    ))
}

/// Encode a buffer as WAV bytes
///
/// # Arguments
/// * `buffer` - The audio to encode
/// * `bit_depth` - 16, 24 (integer PCM) or 32 (float)
pub fn encode_wav(buffer: &DecodedBuffer, bit_depth: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: buffer.num_channels().max(1) as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        let interleaved = buffer.to_interleaved();

        match bit_depth {
            16 => {
                for sample in interleaved {
                    writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
                }
            }
            24 => {
                for sample in interleaved {
                    // 24-bit stored as i32 in hound
                    writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?;
                }
            }
            32 => {
                for sample in interleaved {
                    writer.write_sample(sample)?;
                }
            }
            _ => {
                return Err(AuralError::UnsupportedFormat {
                    format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
                });
            }
        }

        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Generate a mono sine tone
///
/// Useful for demos and tests that need a decodable sound.
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> DecodedBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;

    let samples = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin() * 0.5)
        .collect();

    DecodedBuffer::new(sample_rate, vec![samples])
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let collected = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>(),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect(),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(AuralError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            })
        }
    };

    collected.map_err(|e| AuralError::DecodeFailed {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_encoded_tone() {
        let tone = generate_test_tone(440.0, 0.1, 8000);
        let bytes = encode_wav(&tone, 16).unwrap();
        let decoded = decode_wav(&bytes).unwrap();

        assert_eq!(decoded.sample_rate(), 8000);
        assert_eq!(decoded.num_channels(), 1);
        assert_eq!(decoded.num_frames(), tone.num_frames());
        assert_relative_eq!(decoded.channel(0)[10], tone.channel(0)[10], epsilon = 1e-3);
    }

    #[test]
    fn test_float_encoding_is_lossless() {
        let stereo = DecodedBuffer::new(22050, vec![vec![0.25, -0.5], vec![0.75, 1.0]]);
        let decoded = decode_wav(&encode_wav(&stereo, 32).unwrap()).unwrap();
        assert_eq!(decoded, stereo);
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let err = decode_wav(&[0, 0, 0]).unwrap_err();
        assert_eq!(err.error_code(), "DECODE_FAILED");
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let tone = generate_test_tone(440.0, 0.01, 8000);
        assert!(encode_wav(&tone, 12).is_err());
    }
}
