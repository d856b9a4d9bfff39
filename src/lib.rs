//! Stepsampler - Audio Consolidation for Step-Samplers
//!
//! Takes a batch of recordings in any common format and produces one WAV file
//! in which every recording occupies a contiguous slice, ready to be loaded
//! into a sampler that plays steps by index.
//!
//! # Architecture
//!
//! Each input passes through the same stages:
//! - Decode: WAV, MP3, FLAC, Ogg/Vorbis or AAC bytes to float samples
//! - Trim: leading and trailing silence below a threshold is removed
//! - Resample / convert: one shared rate, channel layout and bit depth
//!
//! The results are concatenated in input order and encoded with cue points
//! marking where each input starts.

pub mod cli;
pub mod codec;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use config::{ProcessParams, ProcessingConfig};
pub use engine::{process, process_named, Pipeline, ProcessOutput, RawInput, Slice};
pub use error::{ProcessError, Result};
