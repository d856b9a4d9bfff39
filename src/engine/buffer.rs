//! Audio Buffer Types
//!
//! Sample containers that flow through the pipeline. Decoded audio lives in a
//! [`SampleBuffer`] as interleaved 32-bit float; after channel/depth conversion it
//! becomes a quantized [`PcmBuffer`] that the concatenator and encoder consume.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

// ============================================================================
// Channel Layout
// ============================================================================

/// Output channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> u16 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    pub fn from_stereo_flag(stereo: bool) -> Self {
        if stereo {
            ChannelLayout::Stereo
        } else {
            ChannelLayout::Mono
        }
    }
}

// ============================================================================
// Bit Depth
// ============================================================================

/// Integer sample width of the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    Eight,
    #[default]
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Bytes occupied by one sample in the data chunk
    pub fn bytes(&self) -> usize {
        self.bits() as usize / 8
    }

    /// Smallest representable sample value
    pub fn min(&self) -> i32 {
        match self {
            BitDepth::ThirtyTwo => i32::MIN,
            _ => -(1 << (self.bits() - 1)),
        }
    }

    /// Largest representable sample value
    pub fn max(&self) -> i32 {
        match self {
            BitDepth::ThirtyTwo => i32::MAX,
            _ => (1 << (self.bits() - 1)) - 1,
        }
    }

    /// Full-scale multiplier between normalized float and integer samples
    pub fn full_scale(&self) -> f64 {
        (1u64 << (self.bits() - 1)) as f64
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = ConvertError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            _ => Err(ConvertError::InvalidBitDepth { bits }),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

// ============================================================================
// Raw Input
// ============================================================================

/// One caller-supplied file: its name and undecoded bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

// ============================================================================
// Sample Buffer
// ============================================================================

/// Decoded audio in the pipeline's working format
///
/// Samples are interleaved 32-bit float normalized to [-1.0, 1.0]. The source
/// bit depth is kept for reporting only.
///
/// # Example
/// ```
/// use stepsampler::engine::SampleBuffer;
///
/// let buffer = SampleBuffer::new(vec![0.0, 0.5, -0.5, 1.0], 44100, 2, 16);
/// assert_eq!(buffer.frames(), 2);
/// assert_eq!(buffer.frame(1), &[-0.5, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Interleaved sample data (L, R, L, R, ... for stereo)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Precision of the source material in bits
    pub source_bits: u16,
}

impl SampleBuffer {
    /// Create a buffer from interleaved samples
    ///
    /// # Panics
    /// If `channels` is zero or `samples` does not hold a whole number of frames.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, source_bits: u16) -> Self {
        assert!(channels > 0, "sample buffer needs at least one channel");
        assert_eq!(
            samples.len() % channels as usize,
            0,
            "sample count {} is not a multiple of channel count {}",
            samples.len(),
            channels
        );
        Self {
            samples,
            sample_rate,
            channels,
            source_bits,
        }
    }

    /// Create a buffer from per-channel sample vectors of equal length
    pub fn from_planar(planar: &[Vec<f32>], sample_rate: u32, source_bits: u16) -> Self {
        let channels = planar.len();
        let frames = planar.first().map_or(0, Vec::len);
        let mut samples = Vec::with_capacity(frames * channels);

        for frame_idx in 0..frames {
            for channel in planar {
                samples.push(channel[frame_idx]);
            }
        }

        Self::new(samples, sample_rate, channels as u16, source_bits)
    }

    /// Split the interleaved samples into one vector per channel
    pub fn to_planar(&self) -> Vec<Vec<f32>> {
        let channels = self.channels as usize;
        let mut planar = vec![Vec::with_capacity(self.frames()); channels];

        for frame in self.samples.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                planar[ch].push(sample);
            }
        }

        planar
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All channel values of one frame
    #[inline]
    pub fn frame(&self, index: usize) -> &[f32] {
        let channels = self.channels as usize;
        &self.samples[index * channels..(index + 1) * channels]
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }
}

// ============================================================================
// PCM Buffer
// ============================================================================

/// Quantized audio at its final rate, layout and bit depth
///
/// Samples are signed integers in `bit_depth.min()..=bit_depth.max()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub samples: Vec<i32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: BitDepth,
}

impl PcmBuffer {
    pub fn new(samples: Vec<i32>, sample_rate: u32, channels: u16, bit_depth: BitDepth) -> Self {
        assert!(channels > 0, "pcm buffer needs at least one channel");
        assert_eq!(samples.len() % channels as usize, 0);
        Self {
            samples,
            sample_rate,
            channels,
            bit_depth,
        }
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Bytes per frame in the data chunk (the WAV block alignment)
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.bit_depth.bytes()
    }

    /// True when both buffers can be joined without conversion
    pub fn same_format(&self, other: &PcmBuffer) -> bool {
        self.sample_rate == other.sample_rate
            && self.channels == other.channels
            && self.bit_depth == other.bit_depth
    }
}

// ============================================================================
// Slice
// ============================================================================

/// Region of the concatenated output contributed by one input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    pub start_frame: usize,
    pub frame_count: usize,
    pub source_index: usize,
}

impl Slice {
    /// First frame after this slice
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.frame_count
    }
}

// ============================================================================
// Test Signals
// ============================================================================

/// Generate a sine tone with the same signal on every channel
///
/// Useful for exercising the pipeline without fixture files.
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    frames: usize,
    sample_rate: u32,
    channels: u16,
) -> SampleBuffer {
    let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;
    let mut samples = Vec::with_capacity(frames * channels as usize);

    for i in 0..frames {
        let value = amplitude * (angular_freq * i as f64).sin() as f32;
        samples.extend(std::iter::repeat(value).take(channels as usize));
    }

    SampleBuffer::new(samples, sample_rate, channels, 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depth_ranges() {
        assert_eq!(BitDepth::Eight.min(), -128);
        assert_eq!(BitDepth::Eight.max(), 127);
        assert_eq!(BitDepth::Sixteen.min(), -32768);
        assert_eq!(BitDepth::Sixteen.max(), 32767);
        assert_eq!(BitDepth::TwentyFour.min(), -8_388_608);
        assert_eq!(BitDepth::TwentyFour.max(), 8_388_607);
        assert_eq!(BitDepth::ThirtyTwo.min(), i32::MIN);
        assert_eq!(BitDepth::ThirtyTwo.max(), i32::MAX);
        assert_eq!(BitDepth::TwentyFour.bytes(), 3);
    }

    #[test]
    fn test_bit_depth_try_from() {
        assert_eq!(BitDepth::try_from(24), Ok(BitDepth::TwentyFour));
        assert_eq!(
            BitDepth::try_from(20),
            Err(ConvertError::InvalidBitDepth { bits: 20 })
        );
        assert_eq!(BitDepth::default(), BitDepth::Sixteen);
    }

    #[test]
    fn test_planar_roundtrip() {
        let left = vec![1.0, 2.0, 3.0];
        let right = vec![4.0, 5.0, 6.0];
        let buffer = SampleBuffer::from_planar(&[left.clone(), right.clone()], 48000, 16);

        assert_eq!(buffer.samples, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(buffer.frames(), 3);

        let planar = buffer.to_planar();
        assert_eq!(planar[0], left);
        assert_eq!(planar[1], right);
    }

    #[test]
    #[should_panic]
    fn test_partial_frame_rejected() {
        SampleBuffer::new(vec![0.0, 0.1, 0.2], 44100, 2, 16);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = SampleBuffer::new(Vec::new(), 44100, 2, 16);
        assert!(buffer.is_empty());
        assert_eq!(buffer.frames(), 0);
        assert_eq!(buffer.peak(), 0.0);
        assert!(buffer.to_planar().iter().all(Vec::is_empty));
    }

    #[test]
    fn test_generate_test_tone() {
        let tone = generate_test_tone(441.0, 0.5, 4410, 44100, 2);
        assert_eq!(tone.frames(), 4410);
        assert_eq!(tone.channels, 2);
        assert!(tone.peak() <= 0.5 + f32::EPSILON);
        assert!(tone.peak() > 0.49);
        // Both channels carry the same signal
        assert_eq!(tone.frame(25)[0], tone.frame(25)[1]);
    }

    #[test]
    fn test_pcm_block_align() {
        let pcm = PcmBuffer::new(vec![0; 6], 44100, 2, BitDepth::TwentyFour);
        assert_eq!(pcm.frames(), 3);
        assert_eq!(pcm.block_align(), 6);
    }
}
