//! Audio resampling using rubato
//!
//! Band-limited windowed-sinc conversion between sample rates. The filter
//! delay is removed so the output lines up with the input in time, and the
//! output length is fixed by [`output_frames`] so slice boundaries are
//! predictable.

use log::debug;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::engine::SampleBuffer;
use crate::error::ResampleError;

/// Input frames handed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Number of output frames for a conversion
///
/// `round(frames * target_rate / source_rate)` with halves rounded up,
/// evaluated exactly in integer arithmetic.
pub fn output_frames(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    let numerator = 2 * frames as u128 * target_rate as u128 + source_rate as u128;
    (numerator / (2 * source_rate as u128)) as usize
}

/// Convert a buffer to `target_rate`
///
/// Equal rates hand the buffer back unchanged. Identical input always
/// produces identical output.
///
/// # Errors
/// * `InvalidRate` - If either rate is zero
/// * `Backend` - If the resampler rejects the conversion ratio
pub fn resample(buffer: SampleBuffer, target_rate: u32) -> Result<SampleBuffer, ResampleError> {
    let source_rate = buffer.sample_rate;
    if target_rate == 0 || source_rate == 0 {
        return Err(ResampleError::InvalidRate {
            from: source_rate,
            to: target_rate,
        });
    }

    if source_rate == target_rate {
        debug!("sample rate already at {} Hz, skipping resample", target_rate);
        return Ok(buffer);
    }

    let wanted = output_frames(buffer.frames(), source_rate, target_rate);

    if buffer.is_empty() {
        return Ok(SampleBuffer::new(
            Vec::new(),
            target_rate,
            buffer.channels,
            buffer.source_bits,
        ));
    }

    debug!(
        "resampling {} frames from {} Hz to {} Hz ({} channels) -> {} frames",
        buffer.frames(),
        source_rate,
        target_rate,
        buffer.channels,
        wanted
    );

    let ratio = target_rate as f64 / source_rate as f64;
    let planar = buffer.to_planar();
    let output = run_sinc(&planar, ratio, wanted)?;

    Ok(SampleBuffer::from_planar(
        &output,
        target_rate,
        buffer.source_bits,
    ))
}

fn sinc_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Feed the whole signal through a sinc resampler and cut exactly `wanted`
/// frames after the filter delay
fn run_sinc(
    planar: &[Vec<f32>],
    ratio: f64,
    wanted: usize,
) -> Result<Vec<Vec<f32>>, ResampleError> {
    let channels = planar.len();
    let frames = planar[0].len();

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, sinc_parameters(), CHUNK_FRAMES, channels)
            .map_err(|e| ResampleError::Backend {
                reason: format!("failed to create resampler: {}", e),
            })?;

    let delay = resampler.output_delay();
    let needed = delay + wanted;
    let mut output = vec![Vec::with_capacity(needed + CHUNK_FRAMES); channels];

    let mut pos = 0;
    while pos < frames {
        let end = (pos + CHUNK_FRAMES).min(frames);
        let chunk: Vec<&[f32]> = planar.iter().map(|ch| &ch[pos..end]).collect();

        let block = if end - pos == CHUNK_FRAMES {
            resampler.process(chunk.as_slice(), None)
        } else {
            resampler.process_partial(Some(chunk.as_slice()), None)
        }
        .map_err(backend_error)?;

        append(&mut output, block);
        pos = end;
    }

    // Flush the filter tail with silence until the delayed signal is complete
    while output[0].len() < needed {
        let block = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(backend_error)?;
        if block[0].is_empty() {
            break;
        }
        append(&mut output, block);
    }

    Ok(output
        .into_iter()
        .map(|mut channel| {
            channel.resize(needed.max(channel.len()), 0.0);
            channel.drain(..delay);
            channel.truncate(wanted);
            channel
        })
        .collect())
}

fn append(output: &mut [Vec<f32>], block: Vec<Vec<f32>>) {
    for (channel, samples) in output.iter_mut().zip(block) {
        channel.extend_from_slice(&samples);
    }
}

fn backend_error(err: rubato::ResampleError) -> ResampleError {
    ResampleError::Backend {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;

    /// Largest sample difference, ignoring `margin` frames at either end
    fn max_interior_error(a: &[f32], b: &[f32], margin: usize) -> f32 {
        a[margin..a.len() - margin]
            .iter()
            .zip(&b[margin..b.len() - margin])
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_output_frames_rounding() {
        assert_eq!(output_frames(1000, 44100, 48000), 1088); // 1088.43
        assert_eq!(output_frames(1088, 48000, 44100), 1000); // 999.6
        assert_eq!(output_frames(3, 2, 3), 5); // 4.5 rounds up
        assert_eq!(output_frames(1, 4, 2), 1); // 0.5 rounds up
        assert_eq!(output_frames(0, 44100, 48000), 0);
        assert_eq!(output_frames(44100, 44100, 22050), 22050);
    }

    #[test]
    fn test_same_rate_is_identity() {
        let tone = generate_test_tone(440.0, 0.5, 1000, 44100, 2);
        let resampled = resample(tone.clone(), 44100).unwrap();

        assert_eq!(resampled, tone);
    }

    #[test]
    fn test_invalid_rate() {
        let tone = generate_test_tone(440.0, 0.5, 100, 44100, 1);
        assert_eq!(
            resample(tone, 0).unwrap_err(),
            ResampleError::InvalidRate { from: 44100, to: 0 }
        );

        let broken = SampleBuffer::new(vec![0.0; 4], 0, 1, 16);
        assert!(matches!(
            resample(broken, 48000),
            Err(ResampleError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_empty_buffer_changes_rate_only() {
        let empty = SampleBuffer::new(Vec::new(), 44100, 2, 16);
        let resampled = resample(empty, 48000).unwrap();

        assert!(resampled.is_empty());
        assert_eq!(resampled.sample_rate, 48000);
        assert_eq!(resampled.channels, 2);
    }

    #[test]
    fn test_frame_count_follows_rounding_rule() {
        for (frames, from, to) in [(1000, 44100, 48000), (1501, 48000, 22050), (7, 8000, 44100)]
        {
            let tone = generate_test_tone(100.0, 0.5, frames, from, 1);
            let resampled = resample(tone, to).unwrap();
            assert_eq!(resampled.frames(), output_frames(frames, from, to));
            assert_eq!(resampled.sample_rate, to);
        }
    }

    #[test]
    fn test_upsampled_tone_matches_reference() {
        let input = generate_test_tone(200.0, 0.5, 4410, 44100, 1);
        let reference = generate_test_tone(200.0, 0.5, 4800, 48000, 1);
        let resampled = resample(input, 48000).unwrap();

        assert_eq!(resampled.frames(), 4800);
        let error = max_interior_error(&resampled.samples, &reference.samples, 300);
        assert!(error < 0.03, "max error {}", error);
    }

    #[test]
    fn test_round_trip_preserves_shape() {
        let original = generate_test_tone(200.0, 0.5, 8820, 44100, 2);
        let there = resample(original.clone(), 48000).unwrap();
        let back = resample(there, 44100).unwrap();

        assert_eq!(back.frames(), original.frames());
        assert_eq!(back.channels, 2);
        let error = max_interior_error(&back.samples, &original.samples, 600);
        assert!(error < 0.03, "max error {}", error);
    }

    #[test]
    fn test_resampling_is_deterministic() {
        let tone = generate_test_tone(523.25, 0.7, 3000, 22050, 2);
        let first = resample(tone.clone(), 44100).unwrap();
        let second = resample(tone, 44100).unwrap();

        assert_eq!(first.samples, second.samples);
    }
}
