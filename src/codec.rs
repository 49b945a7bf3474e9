//! Sound payload transcoding
//!
//! Sounds travel as data-URI style text: `<prefix>,<base64 data>`. The
//! prefix (usually `data:audio/wav;base64`) is discarded on the way in.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::engine::{encode_wav, DecodedBuffer};
use crate::error::{AuralError, Result};

/// Extract the raw bytes from an encoded payload
///
/// # Errors
/// * `InvalidPayload` - If there is no comma-separated prefix or the data
///   is not valid base64
pub fn payload_bytes(payload: &str) -> Result<Vec<u8>> {
    let (_, data) = payload
        .split_once(',')
        .ok_or_else(|| AuralError::InvalidPayload {
            reason: "missing ',' after the payload prefix".to_string(),
        })?;

    STANDARD
        .decode(data.trim())
        .map_err(|e| AuralError::InvalidPayload {
            reason: format!("bad base64 data: {}", e),
        })
}

/// Build a `data:<mime>;base64,...` payload
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Encode a buffer as a 16-bit WAV payload
pub fn wav_data_uri(buffer: &DecodedBuffer) -> Result<String> {
    Ok(encode_data_uri("audio/wav", &encode_wav(buffer, 16)?))
}

/// Read a sound file into a payload
pub fn file_data_uri(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(AuralError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let bytes = fs::read(path)?;
    Ok(encode_data_uri(mime_for(path), &bytes))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("wav") | Some("wave") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{decode_wav, generate_test_tone};

    #[test]
    fn test_prefix_is_discarded() {
        assert_eq!(payload_bytes("data:audio/wav;base64,AAAA").unwrap(), vec![0, 0, 0]);
        assert_eq!(payload_bytes("anything at all,aGk=").unwrap(), b"hi".to_vec());
    }

    #[test]
    fn test_missing_prefix_is_rejected() {
        let err = payload_bytes("AAAA").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PAYLOAD");
    }

    #[test]
    fn test_bad_base64_is_rejected() {
        assert!(payload_bytes("data:audio/wav;base64,@@@").is_err());
    }

    #[test]
    fn test_wav_payload_decodes() {
        let tone = generate_test_tone(220.0, 0.05, 8000);
        let payload = wav_data_uri(&tone).unwrap();
        assert!(payload.starts_with("data:audio/wav;base64,"));

        let decoded = decode_wav(&payload_bytes(&payload).unwrap()).unwrap();
        assert_eq!(decoded.num_frames(), tone.num_frames());
    }

    #[test]
    fn test_file_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blip.WAV");
        std::fs::write(&path, b"RIFF").unwrap();

        let payload = file_data_uri(&path).unwrap();
        assert_eq!(payload, "data:audio/wav;base64,UklGRg==");

        assert!(file_data_uri(&dir.path().join("missing.wav")).is_err());
    }
}
