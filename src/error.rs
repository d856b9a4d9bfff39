//! Error handling for stepsampler
//!
//! Every pipeline stage has its own error enum. [`ProcessError`] is what callers
//! of [`crate::process`] see: it separates bad input (configuration or an
//! undecodable file) from internal failures so the two can be reported differently.

use thiserror::Error;

/// Result type alias for stepsampler operations
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Failure to turn one input buffer into samples
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unrecognized audio format")]
    UnrecognizedFormat,

    #[error("Truncated audio data: {detail}")]
    Truncated { detail: String },

    #[error("Unsupported encoding: {detail}")]
    UnsupportedEncoding { detail: String },
}

impl DecodeError {
    pub(crate) fn truncated(detail: impl Into<String>) -> Self {
        DecodeError::Truncated {
            detail: detail.into(),
        }
    }

    pub(crate) fn unsupported(detail: impl Into<String>) -> Self {
        DecodeError::UnsupportedEncoding {
            detail: detail.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResampleError {
    #[error("Invalid sample rate conversion: {from} Hz -> {to} Hz")]
    InvalidRate { from: u32, to: u32 },

    #[error("Resampler failure: {reason}")]
    Backend { reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Invalid bit depth: {bits} (expected 8, 16, 24 or 32)")]
    InvalidBitDepth { bits: u16 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Output too large for a RIFF container: {bytes} bytes")]
    TooLarge { bytes: u64 },
}

/// Parameter validation failures, raised before any input is touched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No input files provided")]
    NoInputs,

    #[error("Invalid output sample rate: {rate} Hz (must be between 1 and 768000)")]
    InvalidRate { rate: i64 },

    #[error("Unsupported bit depth: {bits} (expected 8, 16, 24 or 32)")]
    UnsupportedBitDepth { bits: i64 },

    #[error("Invalid silence threshold: {threshold} (must be a non-negative number)")]
    InvalidThreshold { threshold: f64 },
}

/// Stage failures that indicate a broken invariant rather than bad input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Caller-facing error for a processing call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to decode input #{index} ({name}): {source}")]
    Decode {
        index: usize,
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error("Internal processing error: {0}")]
    Internal(#[from] InternalError),
}

impl From<ResampleError> for ProcessError {
    fn from(err: ResampleError) -> Self {
        ProcessError::Internal(err.into())
    }
}

impl From<ConvertError> for ProcessError {
    fn from(err: ConvertError) -> Self {
        ProcessError::Internal(err.into())
    }
}

impl From<EncodeError> for ProcessError {
    fn from(err: EncodeError) -> Self {
        ProcessError::Internal(err.into())
    }
}

impl ProcessError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ProcessError::Config(ConfigError::NoInputs) => "NO_INPUTS",
            ProcessError::Config(ConfigError::InvalidRate { .. }) => "INVALID_RATE",
            ProcessError::Config(ConfigError::UnsupportedBitDepth { .. }) => {
                "UNSUPPORTED_BIT_DEPTH"
            }
            ProcessError::Config(ConfigError::InvalidThreshold { .. }) => "INVALID_THRESHOLD",
            ProcessError::Decode { source, .. } => match source {
                DecodeError::UnrecognizedFormat => "UNRECOGNIZED_FORMAT",
                DecodeError::Truncated { .. } => "TRUNCATED",
                DecodeError::UnsupportedEncoding { .. } => "UNSUPPORTED_ENCODING",
            },
            ProcessError::Internal(InternalError::Resample(_)) => "RESAMPLE_ERROR",
            ProcessError::Internal(InternalError::Convert(_)) => "CONVERT_ERROR",
            ProcessError::Internal(InternalError::Encode(_)) => "ENCODE_ERROR",
        }
    }

    /// True when the caller's input (parameters or files) was at fault
    pub fn is_input_error(&self) -> bool {
        matches!(self, ProcessError::Config(_) | ProcessError::Decode { .. })
    }

    /// The decode failure, if this error came from one of the inputs
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            ProcessError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ProcessError::Config(ConfigError::NoInputs) => vec!["Add at least one audio file"],
            ProcessError::Config(_) => vec![
                "Sample rate must be between 1 and 768000 Hz",
                "Silence threshold must be a non-negative number",
                "Bit depth must be one of 8, 16, 24 or 32",
            ],
            ProcessError::Decode { source, .. } => match source {
                DecodeError::UnrecognizedFormat => vec![
                    "Supported formats: WAV, MP3, FLAC, OGG Vorbis, AAC/M4A",
                    "Convert the file to WAV and try again",
                ],
                DecodeError::Truncated { .. } => vec![
                    "The file appears cut off - try re-exporting it from the source",
                ],
                DecodeError::UnsupportedEncoding { .. } => vec![
                    "Re-export as 16 or 24-bit PCM WAV",
                ],
            },
            ProcessError::Internal(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ProcessError::Decode {
            index: 1,
            name: "kick.wav".to_string(),
            source: DecodeError::truncated("data chunk"),
        };
        assert_eq!(err.error_code(), "TRUNCATED");
        assert!(err.is_input_error());
        assert!(err.to_string().contains("kick.wav"));
    }

    #[test]
    fn test_internal_errors_are_not_input_errors() {
        let err: ProcessError = ConvertError::InvalidBitDepth { bits: 12 }.into();
        assert_eq!(err.error_code(), "CONVERT_ERROR");
        assert!(!err.is_input_error());
        assert!(err.decode_error().is_none());

        let err: ProcessError = ResampleError::InvalidRate { from: 44100, to: 0 }.into();
        assert_eq!(err.error_code(), "RESAMPLE_ERROR");
    }

    #[test]
    fn test_config_errors_are_input_errors() {
        let err: ProcessError = ConfigError::UnsupportedBitDepth { bits: 12 }.into();
        assert!(err.is_input_error());
        assert_eq!(err.error_code(), "UNSUPPORTED_BIT_DEPTH");
        assert!(!err.recovery_suggestions().is_empty());
    }
}
