//! Per-input signal processing stages
//!
//! Each stage takes its buffer by value and returns a new one, in pipeline order:
//! trim → normalize → resample → convert.

mod convert;
mod normalize;
mod resample;
mod trim;

pub use convert::{convert, quantize};
pub use normalize::normalize_peak;
pub use resample::{output_frames, resample};
pub use trim::trim;
