//! Error handling for Aural
//!
//! Only boundary code returns these. Inside an operation chain, decode and
//! payload problems are recorded as buffer status instead of propagated.

use thiserror::Error;

/// Result type alias for Aural operations
pub type Result<T> = std::result::Result<T, AuralError>;

/// Main error type for Aural operations
#[derive(Error, Debug)]
pub enum AuralError {
    // Combinator Errors
    #[error("No operation registered under '{name}'")]
    UnknownOperation { name: String },

    // Payload Errors
    #[error("Invalid sound payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Audio decode failed: {reason}")]
    DecodeFailed { reason: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuralError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AuralError::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            AuralError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            AuralError::DecodeFailed { .. } => "DECODE_FAILED",
            AuralError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AuralError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AuralError::InvalidConfig { .. } => "INVALID_CONFIG",
            AuralError::Io(_) => "IO_ERROR",
            AuralError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors concern one sound or one file; the rest of a
    /// session can carry on without it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuralError::InvalidPayload { .. }
                | AuralError::DecodeFailed { .. }
                | AuralError::UnsupportedFormat { .. }
                | AuralError::FileNotFound { .. }
        )
    }
}

impl From<hound::Error> for AuralError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AuralError::Io(e),
            hound::Error::Unsupported => AuralError::UnsupportedFormat {
                format: "unsupported WAV encoding".to_string(),
            },
            other => AuralError::DecodeFailed {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AuralError::UnknownOperation {
            name: "fly".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_OPERATION");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_decode_errors_are_recoverable() {
        let err = AuralError::DecodeFailed {
            reason: "truncated header".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Audio decode failed: truncated header");
    }

    #[test]
    fn test_hound_error_conversion() {
        let err: AuralError = hound::Error::FormatError("no RIFF tag found").into();
        assert_eq!(err.error_code(), "DECODE_FAILED");
    }
}
