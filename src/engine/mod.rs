//! Audio Engine Module
//!
//! Core data flow of a processing call:
//! - Sample and PCM buffer types
//! - Concatenation into one sliced buffer
//! - The pipeline that drives every stage

pub mod buffer;
pub mod concat;
pub mod pipeline;

pub use buffer::{
    generate_test_tone, BitDepth, ChannelLayout, PcmBuffer, RawInput, SampleBuffer, Slice,
};
pub use concat::{concat, pad_to_longest};
pub use pipeline::{process, process_named, Pipeline, ProcessOutput};
