//! Concatenation of normalized buffers
//!
//! The single join point of the pipeline: every buffer has already been brought
//! to the same rate, layout and bit depth, so joining is a plain append plus the
//! bookkeeping of where each input landed.

use log::debug;

use super::buffer::{PcmBuffer, Slice};

/// Append buffers in order and record one slice per input
///
/// `start_frame` of slice `i` is the sum of the frame counts of inputs `0..i`.
/// Zero-length inputs still get a slice.
///
/// # Panics
/// If `buffers` is empty or the buffers do not share one format. Both indicate
/// an upstream stage broke its contract.
pub fn concat(buffers: Vec<PcmBuffer>) -> (PcmBuffer, Vec<Slice>) {
    assert!(!buffers.is_empty(), "concat needs at least one buffer");
    let first = &buffers[0];
    let (sample_rate, channels, bit_depth) = (first.sample_rate, first.channels, first.bit_depth);

    for (index, buffer) in buffers.iter().enumerate() {
        assert!(
            buffer.same_format(first),
            "buffer {} is {} Hz/{} ch/{} bits, expected {} Hz/{} ch/{} bits",
            index,
            buffer.sample_rate,
            buffer.channels,
            buffer.bit_depth.bits(),
            sample_rate,
            channels,
            bit_depth.bits()
        );
    }

    let total_samples: usize = buffers.iter().map(|b| b.samples.len()).sum();
    let mut samples = Vec::with_capacity(total_samples);
    let mut slices = Vec::with_capacity(buffers.len());
    let mut start_frame = 0;

    for (source_index, buffer) in buffers.into_iter().enumerate() {
        let frame_count = buffer.frames();
        slices.push(Slice {
            start_frame,
            frame_count,
            source_index,
        });
        start_frame += frame_count;
        samples.extend(buffer.samples);
    }

    debug!("concatenated {} slices, {} frames", slices.len(), start_frame);

    (PcmBuffer::new(samples, sample_rate, channels, bit_depth), slices)
}

/// Pad every buffer with trailing silence up to the longest frame count
///
/// Gives each step the same length so slices sit on an even grid.
pub fn pad_to_longest(buffers: &mut [PcmBuffer]) {
    let longest = buffers.iter().map(PcmBuffer::frames).max().unwrap_or(0);

    for buffer in buffers.iter_mut() {
        let wanted = longest * buffer.channels as usize;
        buffer.samples.resize(wanted, 0);
    }

    debug!("padded {} buffers to {} frames", buffers.len(), longest);
}
