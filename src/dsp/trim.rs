//! Silence trimming
//!
//! Removes leading and trailing frames whose every channel sits at or below a
//! linear amplitude threshold. Interior frames are never touched, so quiet
//! passages inside a recording survive.

use log::debug;

use crate::engine::SampleBuffer;

/// Trim leading and trailing silence
///
/// Keeps the inclusive range from the first to the last non-silent frame. A
/// buffer that is silent throughout comes back empty. `None` returns the buffer
/// unchanged.
pub fn trim(buffer: SampleBuffer, threshold: Option<f32>) -> SampleBuffer {
    let Some(threshold) = threshold else {
        return buffer;
    };

    let channels = buffer.channels as usize;
    let is_loud = |frame: &[f32]| frame.iter().any(|s| s.abs() > threshold);

    let first = buffer.samples.chunks_exact(channels).position(is_loud);
    let last = buffer.samples.chunks_exact(channels).rposition(is_loud);

    let (start, end) = match (first, last) {
        (Some(first), Some(last)) => (first, last + 1),
        _ => (0, 0),
    };

    debug!(
        "trim at {}: keeping frames {}..{} of {}",
        threshold,
        start,
        end,
        buffer.frames()
    );

    if start == 0 && end == buffer.frames() {
        return buffer;
    }

    let SampleBuffer {
        mut samples,
        sample_rate,
        channels: channel_count,
        source_bits,
    } = buffer;

    samples.truncate(end * channels);
    samples.drain(..start * channels);

    SampleBuffer::new(samples, sample_rate, channel_count, source_bits)
}
