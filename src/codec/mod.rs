//! Codec Module
//!
//! Reading input formats and writing the output WAV:
//! - Format decoders behind a common trait, selected by header signature
//! - Canonical PCM WAV encoder with slice marker chunks
//! - RIFF chunk reader for recovering slice markers

pub mod compressed;
pub mod decoder;
pub mod encoder;
pub mod riff;
pub mod wav;

pub use compressed::{detect_container, CompressedDecoder};
pub use decoder::{DecoderRegistry, FormatDecoder};
pub use encoder::WavEncoder;
pub use riff::{read_slice_markers, read_slices, SliceMarker};
pub use wav::WavDecoder;
