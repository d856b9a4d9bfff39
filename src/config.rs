//! Processing parameters
//!
//! [`ProcessParams`] is what a caller hands in: every field optional and loosely
//! typed, as it arrives from a form or a JSON file. [`ProcessParams::validate`]
//! turns it into a [`ProcessingConfig`] that the pipeline trusts without further
//! checks.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::{BitDepth, ChannelLayout};
use crate::error::ConfigError;

/// Output bit depth when none is requested
pub const DEFAULT_BIT_DEPTH: u16 = 16;

/// Threshold the CLI applies when trimming is requested without a value
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.005;

/// Highest accepted output rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Caller-supplied parameters, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessParams {
    /// Output rate in Hz; unset uses the rate of the first input
    pub output_rate: Option<i64>,

    /// Linear amplitude at or below which edge frames are trimmed; unset disables trimming
    pub silence_threshold: Option<f64>,

    /// Stereo output; unset means mono
    pub stereo: Option<bool>,

    /// Output bits per sample; unset means 16
    pub bit_depth: Option<i64>,

    /// Scale each input so its peak reaches full scale
    pub normalize: bool,

    /// Pad every input to the longest one
    pub equal_slices: bool,

    /// Write cue points and labels for each slice
    pub slice_markers: bool,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            output_rate: None,
            silence_threshold: None,
            stereo: None,
            bit_depth: None,
            normalize: false,
            equal_slices: false,
            slice_markers: true,
        }
    }
}

impl ProcessParams {
    /// Build parameters from raw form text
    ///
    /// Empty or non-numeric values are treated as unset and logged, so a stray
    /// character in a form field falls back to the default instead of failing
    /// the whole request. Numeric values are kept as given and checked by
    /// [`validate`](Self::validate).
    pub fn from_text_fields(
        output_rate: &str,
        silence_threshold: &str,
        stereo: &str,
        bit_depth: &str,
    ) -> Self {
        Self {
            output_rate: parse_field("output_rate", output_rate),
            silence_threshold: parse_field("silence_threshold", silence_threshold),
            stereo: parse_flag(stereo),
            bit_depth: parse_field("bit_depth", bit_depth),
            ..Self::default()
        }
    }

    /// Check every parameter and resolve defaults
    ///
    /// # Errors
    /// * `InvalidRate` - If the rate is zero, negative or above [`MAX_SAMPLE_RATE`]
    /// * `UnsupportedBitDepth` - If the bit depth is not 8, 16, 24 or 32
    /// * `InvalidThreshold` - If the threshold is negative or not finite
    pub fn validate(&self) -> Result<ProcessingConfig, ConfigError> {
        let output_rate = match self.output_rate {
            None => None,
            Some(rate) if rate > 0 && rate <= MAX_SAMPLE_RATE as i64 => Some(rate as u32),
            Some(rate) => return Err(ConfigError::InvalidRate { rate }),
        };

        let bits = self.bit_depth.unwrap_or(DEFAULT_BIT_DEPTH as i64);
        let bit_depth = u16::try_from(bits)
            .ok()
            .and_then(|b| BitDepth::try_from(b).ok())
            .ok_or(ConfigError::UnsupportedBitDepth { bits })?;

        let silence_threshold = match self.silence_threshold {
            None => None,
            Some(t) if t.is_finite() && t >= 0.0 => Some(t as f32),
            Some(threshold) => return Err(ConfigError::InvalidThreshold { threshold }),
        };

        Ok(ProcessingConfig {
            output_rate,
            silence_threshold,
            layout: ChannelLayout::from_stereo_flag(self.stereo.unwrap_or(false)),
            bit_depth,
            normalize: self.normalize,
            equal_slices: self.equal_slices,
            slice_markers: self.slice_markers,
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, text: &str) -> Option<T> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring non-numeric {} {:?}, using default", field, text);
            None
        }
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        other => {
            warn!("ignoring unrecognized stereo flag {:?}, using mono", other);
            None
        }
    }
}

/// Validated settings applied to every input of one call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingConfig {
    /// Target rate; `None` adopts the first decoded input's rate
    pub output_rate: Option<u32>,
    pub silence_threshold: Option<f32>,
    pub layout: ChannelLayout,
    pub bit_depth: BitDepth,
    pub normalize: bool,
    pub equal_slices: bool,
    pub slice_markers: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            output_rate: None,
            silence_threshold: None,
            layout: ChannelLayout::Mono,
            bit_depth: BitDepth::default(),
            normalize: false,
            equal_slices: false,
            slice_markers: true,
        }
    }
}

impl fmt::Display for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.output_rate {
            Some(rate) => write!(f, "rate: {} Hz", rate)?,
            None => write!(f, "rate: from first input")?,
        }
        match self.silence_threshold {
            Some(threshold) => write!(f, ", silence threshold: {}", threshold)?,
            None => write!(f, ", no trimming")?,
        }
        write!(
            f,
            ", {}, {}-bit",
            match self.layout {
                ChannelLayout::Mono => "mono",
                ChannelLayout::Stereo => "stereo",
            },
            self.bit_depth.bits()
        )?;
        if self.normalize {
            write!(f, ", normalized")?;
        }
        if self.equal_slices {
            write!(f, ", equal slices")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = ProcessParams::default().validate().unwrap();

        assert_eq!(config, ProcessingConfig::default());
        assert_eq!(config.bit_depth.bits(), DEFAULT_BIT_DEPTH);
        assert_eq!(config.layout, ChannelLayout::Mono);
        assert!(config.slice_markers);
    }

    #[test]
    fn test_valid_params() {
        let params = ProcessParams {
            output_rate: Some(48000),
            silence_threshold: Some(0.01),
            stereo: Some(true),
            bit_depth: Some(24),
            ..Default::default()
        };
        let config = params.validate().unwrap();

        assert_eq!(config.output_rate, Some(48000));
        assert_eq!(config.silence_threshold, Some(0.01));
        assert_eq!(config.layout, ChannelLayout::Stereo);
        assert_eq!(config.bit_depth, BitDepth::TwentyFour);
    }

    #[test_case(0 ; "zero")]
    #[test_case(-44100 ; "negative")]
    #[test_case(768_001 ; "above maximum")]
    fn test_invalid_rate(rate: i64) {
        let params = ProcessParams {
            output_rate: Some(rate),
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ConfigError::InvalidRate { rate }));
    }

    #[test_case(12 ; "between supported depths")]
    #[test_case(0 ; "zero")]
    #[test_case(-16 ; "negative")]
    #[test_case(65552 ; "wraps to 16 as u16")]
    fn test_unsupported_bit_depth(bits: i64) {
        let params = ProcessParams {
            bit_depth: Some(bits),
            ..Default::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::UnsupportedBitDepth { bits })
        );
    }

    #[test]
    fn test_invalid_threshold() {
        let params = ProcessParams {
            silence_threshold: Some(-0.1),
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));

        let params = ProcessParams {
            silence_threshold: Some(f64::NAN),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_lenient_text_fields() {
        let params = ProcessParams::from_text_fields("48k", " 0.02 ", "on", "");
        assert_eq!(params.output_rate, None);
        assert_eq!(params.silence_threshold, Some(0.02));
        assert_eq!(params.stereo, Some(true));
        assert_eq!(params.bit_depth, None);
        assert!(params.validate().is_ok());

        // Numeric but out of range is still an error
        let params = ProcessParams::from_text_fields("-1", "", "", "24");
        assert_eq!(
            params.validate(),
            Err(ConfigError::InvalidRate { rate: -1 })
        );
    }

    #[test]
    fn test_json_round_trip() {
        let params: ProcessParams =
            serde_json::from_str(r#"{"output_rate": 22050, "equal_slices": true}"#).unwrap();
        assert_eq!(params.output_rate, Some(22050));
        assert!(params.equal_slices);
        assert!(params.slice_markers);
        assert_eq!(params.stereo, None);

        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(serde_json::from_str::<ProcessParams>(&json).unwrap(), params);
    }

    #[test]
    fn test_display() {
        let config = ProcessParams {
            output_rate: Some(44100),
            silence_threshold: Some(0.005),
            stereo: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(
            config.to_string(),
            "rate: 44100 Hz, silence threshold: 0.005, stereo, 16-bit"
        );
    }
}
