//! Channel layout and bit depth conversion
//!
//! Last stage to touch sample values: maps any source channel count to mono or
//! stereo, then quantizes to the output integer width.

use log::debug;

use crate::engine::{BitDepth, ChannelLayout, PcmBuffer, SampleBuffer};
use crate::error::ConvertError;

/// Convert to the target layout and quantize to `bits`
///
/// - mono → stereo duplicates the channel
/// - stereo → mono takes the arithmetic mean of both channels
/// - more than two channels → mono averages all, stereo keeps the first two
///
/// # Errors
/// * `InvalidBitDepth` - If `bits` is not 8, 16, 24 or 32
pub fn convert(
    buffer: SampleBuffer,
    layout: ChannelLayout,
    bits: u16,
) -> Result<PcmBuffer, ConvertError> {
    let depth = BitDepth::try_from(bits)?;

    debug!(
        "converting {} ch -> {:?}, {} bits -> {} bits",
        buffer.channels, layout, buffer.source_bits, bits
    );

    let remapped = remap_channels(&buffer, layout);
    let samples = remapped.iter().map(|&s| quantize(s, depth)).collect();

    Ok(PcmBuffer::new(
        samples,
        buffer.sample_rate,
        layout.num_channels(),
        depth,
    ))
}

/// Scale a normalized sample to `depth`, rounding to nearest and clamping
///
/// NaN becomes zero.
pub fn quantize(sample: f32, depth: BitDepth) -> i32 {
    let scaled = (sample as f64 * depth.full_scale()).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(depth.min() as f64, depth.max() as f64) as i32
}

fn remap_channels(buffer: &SampleBuffer, layout: ChannelLayout) -> Vec<f32> {
    let source_channels = buffer.channels as usize;
    let frames = buffer.samples.chunks_exact(source_channels);

    match (layout, source_channels) {
        (ChannelLayout::Mono, 1) | (ChannelLayout::Stereo, 2) => buffer.samples.clone(),
        (ChannelLayout::Stereo, 1) => buffer.samples.iter().flat_map(|&s| [s, s]).collect(),
        (ChannelLayout::Stereo, _) => frames.flat_map(|frame| [frame[0], frame[1]]).collect(),
        (ChannelLayout::Mono, n) => frames
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let buffer = SampleBuffer::new(vec![0.5, -0.25], 44100, 1, 16);
        let pcm = convert(buffer, ChannelLayout::Stereo, 16).unwrap();

        assert_eq!(pcm.channels, 2);
        assert_eq!(pcm.samples, vec![16384, 16384, -8192, -8192]);
    }

    #[test]
    fn test_stereo_to_mono_averages() {
        let buffer = SampleBuffer::new(vec![0.5, 0.0, -0.5, -0.25, 1.0, -1.0], 44100, 2, 16);
        let pcm = convert(buffer, ChannelLayout::Mono, 16).unwrap();

        assert_eq!(pcm.channels, 1);
        assert_eq!(pcm.samples, vec![8192, -12288, 0]);
    }

    #[test]
    fn test_multichannel_downmix() {
        // Two frames of 4-channel audio
        let buffer = SampleBuffer::new(
            vec![0.5, 0.25, 0.25, 0.0, -0.5, -0.5, 0.5, 0.5],
            48000,
            4,
            24,
        );

        let mono = convert(buffer.clone(), ChannelLayout::Mono, 16).unwrap();
        assert_eq!(mono.samples, vec![8192, 0]);

        let stereo = convert(buffer, ChannelLayout::Stereo, 16).unwrap();
        assert_eq!(stereo.samples, vec![16384, 8192, -16384, -16384]);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        // 0.5 / 32768 is exactly half a step: rounds away from zero
        assert_eq!(quantize(0.5 / 32768.0, BitDepth::Sixteen), 1);
        assert_eq!(quantize(0.4 / 32768.0, BitDepth::Sixteen), 0);
        assert_eq!(quantize(-0.6 / 32768.0, BitDepth::Sixteen), -1);
        assert_eq!(quantize(0.5, BitDepth::Eight), 64);
    }

    #[test]
    fn test_quantize_clamps_full_scale() {
        assert_eq!(quantize(1.0, BitDepth::Sixteen), 32767);
        assert_eq!(quantize(1.7, BitDepth::Sixteen), 32767);
        assert_eq!(quantize(-1.0, BitDepth::Sixteen), -32768);
        assert_eq!(quantize(-3.0, BitDepth::Eight), -128);
        assert_eq!(quantize(1.0, BitDepth::TwentyFour), 8_388_607);
        assert_eq!(quantize(1.0, BitDepth::ThirtyTwo), i32::MAX);
        assert_eq!(quantize(-1.0, BitDepth::ThirtyTwo), i32::MIN);
        assert_eq!(quantize(f32::NAN, BitDepth::Sixteen), 0);
        assert_eq!(quantize(f32::INFINITY, BitDepth::Sixteen), 32767);
    }

    #[test]
    fn test_same_depth_round_trip_is_exact() {
        let originals = [-32768, -1234, -1, 0, 1, 4321, 32767];
        let samples = originals.iter().map(|&v| v as f32 / 32768.0).collect();
        let buffer = SampleBuffer::new(samples, 44100, 1, 16);
        let pcm = convert(buffer, ChannelLayout::Mono, 16).unwrap();

        assert_eq!(pcm.samples, originals.to_vec());
    }

    #[test]
    fn test_invalid_bit_depth() {
        let buffer = SampleBuffer::new(vec![0.0], 44100, 1, 16);
        assert_eq!(
            convert(buffer, ChannelLayout::Mono, 12).unwrap_err(),
            ConvertError::InvalidBitDepth { bits: 12 }
        );
    }
}
