//! Peak normalization
//!
//! Scales a buffer so its loudest sample reaches full scale, which evens out
//! the level of steps recorded at different gains.

use log::debug;

use crate::engine::SampleBuffer;

/// Scale every sample so the absolute peak becomes 1.0
///
/// Silent and empty buffers are returned unchanged.
pub fn normalize_peak(mut buffer: SampleBuffer) -> SampleBuffer {
    let peak = buffer.peak();
    if peak <= 0.0 || !peak.is_finite() {
        return buffer;
    }

    let gain = 1.0 / peak;
    debug!("peak {:.4}, applying gain {:.4}", peak, gain);

    buffer.samples.iter_mut().for_each(|s| *s *= gain);
    buffer
}
